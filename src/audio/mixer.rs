use std::collections::VecDeque;

use super::bus::ToneReceiver;
use crate::synth::{ScheduledTone, ToneVoice};

const MAX_PENDING: usize = 64;
const MAX_VOICES: usize = 32;

/// Turns scheduled tones into samples at their exact start frame.
///
/// Shared by the realtime callback and the offline renderer.
pub struct ToneMixer {
    sample_rate: f32,
    rx: ToneReceiver,
    /// Tones waiting for their start time, ordered by start
    pending: VecDeque<ScheduledTone>,
    voices: Vec<ToneVoice>,
}

impl ToneMixer {
    pub fn new(sample_rate: f32, rx: ToneReceiver) -> Self {
        Self {
            sample_rate,
            rx,
            pending: VecDeque::with_capacity(MAX_PENDING),
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    /// Pull everything currently on the bus into the pending queue
    pub fn drain_bus(&mut self) {
        while let Some(tone) = self.rx.try_recv() {
            // Tones from one session arrive in order; insert defensively anyway
            let pos = self
                .pending
                .iter()
                .position(|p| p.start > tone.start)
                .unwrap_or(self.pending.len());
            self.pending.insert(pos, tone);
        }
    }

    /// Render one mono frame whose clock time is `frame_time`.
    pub fn next_sample(&mut self, frame_time: f64) -> f32 {
        // Tones already in the past start now
        while self
            .pending
            .front()
            .is_some_and(|tone| tone.start <= frame_time)
        {
            if let Some(tone) = self.pending.pop_front() {
                self.voices.push(ToneVoice::new(self.sample_rate, tone.params));
            }
        }

        let mut mix = 0.0f32;
        for voice in self.voices.iter_mut() {
            mix += voice.next_sample();
        }
        self.voices.retain(|voice| !voice.is_finished());

        soft_clip(mix)
    }

    #[cfg(test)]
    fn active_voices(&self) -> usize {
        self.voices.len()
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Soft clipping function to prevent harsh digital clipping
pub fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - (-x + 1.0).exp() * 0.5
    } else if x < -1.0 {
        -1.0 + (x + 1.0).exp() * 0.5
    } else {
        x
    }
}
