use crate::audio::ToneSink;

/// Shape of the percussive pulse
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneParams {
    /// Oscillator frequency in Hz
    pub frequency: f32,
    /// Gain at the start of the tone
    pub peak_gain: f32,
    /// Gain the exponential ramp reaches at `duration`
    pub floor_gain: f32,
    /// Seconds until the tone hard-stops
    pub duration: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            frequency: 60.0,
            peak_gain: 0.6,
            floor_gain: 0.001,
            duration: 0.15,
        }
    }
}

/// A tone request in the clock's time domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledTone {
    pub start: f64,
    pub params: ToneParams,
}

/// Stateless tone factory: turns a trigger time into a scheduled tone.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToneSynth {
    params: ToneParams,
}

impl ToneSynth {
    /// Schedule one tone to sound at `at`. Fire-and-forget.
    pub fn trigger(&self, sink: &dyn ToneSink, at: f64) {
        sink.schedule(ScheduledTone {
            start: at,
            params: self.params,
        });
    }
}

/// One sounding tone, rendered on the audio thread
pub struct ToneVoice {
    /// Current sample index (None = finished)
    sample_index: Option<usize>,
    sample_rate: f32,
    duration_samples: usize,
    /// Accumulated oscillator phase (0.0 to 1.0)
    osc_phase: f32,
    /// Per-sample multiplier of the exponential gain ramp
    decay_per_sample: f32,
    gain: f32,
    params: ToneParams,
}

impl ToneVoice {
    pub fn new(sample_rate: f32, params: ToneParams) -> Self {
        let duration_samples = (sample_rate * params.duration).round() as usize;
        // gain(t) = peak * (floor / peak)^(t / duration)
        let decay_per_sample = (params.floor_gain / params.peak_gain)
            .powf(1.0 / duration_samples.max(1) as f32);
        Self {
            sample_index: Some(0),
            sample_rate,
            duration_samples,
            osc_phase: 0.0,
            decay_per_sample,
            gain: params.peak_gain,
            params,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.sample_index.is_none()
    }

    /// Generate the next sample
    pub fn next_sample(&mut self) -> f32 {
        let Some(index) = self.sample_index else {
            return 0.0;
        };

        if index >= self.duration_samples {
            self.sample_index = None;
            return 0.0;
        }

        let osc = (self.osc_phase * std::f32::consts::TAU).sin();
        let sample = osc * self.gain;

        self.osc_phase += self.params.frequency / self.sample_rate;
        if self.osc_phase >= 1.0 {
            self.osc_phase -= 1.0;
        }
        self.gain *= self.decay_per_sample;
        self.sample_index = Some(index + 1);

        sample
    }
}
