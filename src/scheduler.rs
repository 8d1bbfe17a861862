//! Look-ahead audio scheduler.
//!
//! A coarse timer decides which beats to queue; the output plays each tone at
//! its exact clock time. Each tick queues every beat that starts before
//! `now + LOOKAHEAD`, so a late tick catches up instead of losing beats.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::audio::ToneSink;
use crate::clock::Clock;
use crate::runtime::{Rearm, Task};
use crate::synth::ToneSynth;

/// How far ahead of the clock tones are queued, in seconds
pub const LOOKAHEAD: f64 = 0.1;
/// Wall-clock cadence of the scheduling decision loop
pub const TICK: Duration = Duration::from_millis(25);
/// Delay from clock origin to the first beat, in seconds
pub const FIRST_BEAT_OFFSET: f64 = 0.1;

pub fn beat_interval(bpm: f64) -> f64 {
    60.0 / bpm
}

pub struct LookAheadScheduler {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ToneSink>,
    synth: ToneSynth,
    running: Arc<AtomicBool>,
    /// Time of beat 0
    origin: f64,
    interval: f64,
    /// Index of the next unfired beat
    next_index: u64,
    next_beat: f64,
}

impl LookAheadScheduler {
    pub fn new(
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ToneSink>,
        synth: ToneSynth,
        bpm: f64,
        running: Arc<AtomicBool>,
    ) -> Self {
        let origin = clock.now() + FIRST_BEAT_OFFSET;
        Self {
            clock,
            sink,
            synth,
            running,
            origin,
            interval: beat_interval(bpm),
            next_index: 0,
            next_beat: origin,
        }
    }

    pub fn beats_fired(&self) -> u64 {
        self.next_index
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Fire every beat inside the look-ahead window. Returns how many fired.
    pub fn tick(&mut self) -> usize {
        if !self.is_running() {
            return 0;
        }

        let horizon = self.clock.now() + LOOKAHEAD;
        let mut fired = 0;
        while self.next_beat < horizon {
            self.synth.trigger(self.sink.as_ref(), self.next_beat);
            self.next_index += 1;
            self.next_beat = self.origin + self.next_index as f64 * self.interval;
            fired += 1;
        }

        if fired > 1 {
            tracing::debug!(fired, next_beat = self.next_beat, "scheduler caught up");
        }
        fired
    }
}

impl Task for LookAheadScheduler {
    fn run(&mut self) -> Rearm {
        if !self.is_running() {
            return Rearm::Finish;
        }
        self.tick();
        Rearm::After(TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::synth::ScheduledTone;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<f64>>);

    impl ToneSink for Recorder {
        fn schedule(&self, tone: ScheduledTone) {
            self.0.lock().push(tone.start);
        }
    }

    fn scheduler(bpm: f64) -> (LookAheadScheduler, ManualClock, Arc<Recorder>, Arc<AtomicBool>) {
        let clock = ManualClock::new();
        let sink = Arc::new(Recorder::default());
        let running = Arc::new(AtomicBool::new(true));
        let sched = LookAheadScheduler::new(
            Arc::new(clock.clone()),
            sink.clone(),
            ToneSynth::default(),
            bpm,
            running.clone(),
        );
        (sched, clock, sink, running)
    }

    #[test]
    fn first_beats_at_124_bpm() {
        let (mut sched, clock, sink, _) = scheduler(124.0);

        // Beat 0 sits exactly on the first horizon, so it waits a tick
        assert_eq!(sched.tick(), 0);
        clock.set(0.025);
        assert_eq!(sched.tick(), 1);
        clock.set(0.5);
        assert_eq!(sched.tick(), 1);
        clock.set(1.0);
        assert_eq!(sched.tick(), 1);

        let fired = sink.0.lock();
        assert!((fired[0] - 0.1).abs() < 1e-9);
        assert!((fired[1] - 0.5839).abs() < 1e-4);
        assert!((fired[2] - 1.0677).abs() < 1e-4);
    }

    #[test]
    fn every_beat_fires_exactly_once_for_any_tempo_and_delay() {
        for bpm in (20..=300).step_by(7) {
            let bpm = bpm as f64;
            // Tick delays from on-time up to the full look-ahead window
            for delay_ms in [0u64, 10, 25, 60, 99] {
                let (mut sched, clock, sink, _) = scheduler(bpm);
                let step = (TICK.as_millis() as u64 + delay_ms) as f64 / 1000.0;
                let end = 20.0;
                while clock.now() < end {
                    sched.tick();
                    clock.advance(step);
                }
                sched.tick();

                let fired = sink.0.lock();
                let interval = beat_interval(bpm);
                assert_eq!(fired.len() as u64, sched.beats_fired());
                for (k, at) in fired.iter().enumerate() {
                    let expected = FIRST_BEAT_OFFSET + k as f64 * interval;
                    assert!((at - expected).abs() < 1e-9, "bpm {} beat {}", bpm, k);
                }
                // Everything due before the final horizon fired, nothing after
                let horizon = clock.now() + LOOKAHEAD;
                assert!(fired.iter().all(|at| *at < horizon));
                assert!(sched.next_beat >= horizon, "bpm {} delay {}ms", bpm, delay_ms);
            }
        }
    }

    #[test]
    fn stalled_timer_catches_up_in_order() {
        let (mut sched, clock, sink, _) = scheduler(120.0);
        assert_eq!(sched.tick(), 0);
        clock.set(2.0);
        // Beats at 0.1, 0.6, 1.1 and 1.6 all fire in one pass
        assert_eq!(sched.tick(), 4);
        let fired = sink.0.lock();
        assert!(fired.windows(2).all(|w| w[0] < w[1]));
        assert!((sched.next_beat - 2.1).abs() < 1e-9);
    }

    #[test]
    fn cleared_flag_makes_tick_a_noop() {
        let (mut sched, clock, sink, running) = scheduler(124.0);
        clock.set(0.05);
        assert_eq!(sched.tick(), 1);
        running.store(false, Ordering::Release);

        clock.set(10.0);
        assert_eq!(sched.tick(), 0);
        assert_eq!(sched.run(), Rearm::Finish);
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[test]
    fn task_rearms_on_the_tick_cadence() {
        let (mut sched, _, _, _) = scheduler(124.0);
        assert_eq!(sched.run(), Rearm::After(TICK));
    }
}
