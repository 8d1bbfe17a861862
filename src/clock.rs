use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic time source shared by the scheduler and the step engine.
pub trait Clock {
    /// Seconds since the clock origin.
    fn now(&self) -> f64;
}

/// Clock driven by the audio output: time is the number of frames the
/// output callback has rendered, divided by the sample rate.
#[derive(Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Total frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Called by the output callback after a buffer has been rendered.
    pub fn advance_frames(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

impl Clock for AudioClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }
}

/// Settable clock for offline rendering and tests. Never moves backwards.
#[derive(Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f64) {
        if seconds > self.now() {
            self.bits.store(seconds.to_bits(), Ordering::Release);
        }
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_clock_counts_frames() {
        let clock = AudioClock::new(48_000);
        assert_eq!(clock.now(), 0.0);
        clock.advance_frames(24_000);
        assert!((clock.now() - 0.5).abs() < 1e-12);

        let shared = clock.clone();
        shared.advance_frames(24_000);
        assert!((clock.now() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set(2.0);
        clock.set(1.5);
        assert_eq!(clock.now(), 2.0);
        clock.advance(0.25);
        assert_eq!(clock.now(), 2.25);
        clock.advance(-1.0);
        assert_eq!(clock.now(), 2.25);
    }
}
