use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::audio::{ToneBus, ToneMixer};
use crate::clock::{Clock, ManualClock};
use crate::config::MetronomeConfig;
use crate::scheduler::{LookAheadScheduler, TICK};
use crate::synth::ToneSynth;

pub const SAMPLE_RATE: u32 = 44100;
const TAIL_SECONDS: f64 = 0.5;
/// Longest render; the whole take is held in memory before writing
pub const MAX_DURATION_SECS: f64 = 10.0 * 60.0;

/// Result of an export operation
pub struct ExportResult {
    pub duration_secs: f64,
    pub samples: usize,
    pub beats: u64,
}

/// Render `seconds` of the pulse offline, plus a decay tail.
///
/// Runs the same look-ahead scheduler as the live session, ticking it every
/// `TICK` of rendered time, so the output matches what a live session plays.
pub fn render_offline(config: &MetronomeConfig, seconds: f64, sample_rate: u32) -> (Vec<f32>, u64) {
    let clock = ManualClock::new();
    let bus = ToneBus::new();
    let mut mixer = ToneMixer::new(sample_rate as f32, bus.receiver());
    let running = Arc::new(AtomicBool::new(true));
    let mut scheduler = LookAheadScheduler::new(
        Arc::new(clock.clone()),
        Arc::new(bus.sender()),
        ToneSynth::default(),
        config.audio_tempo_bpm,
        running,
    );

    let rate = sample_rate as f64;
    let content_frames = (seconds * rate).round() as u64;
    let total_frames = content_frames + (TAIL_SECONDS * rate).round() as u64;
    let tick_frames = ((TICK.as_secs_f64() * rate).round() as u64).max(1);

    let mut output = Vec::with_capacity(total_frames as usize);
    for frame in 0..total_frames {
        let frame_time = frame as f64 / rate;
        if frame < content_frames && frame % tick_frames == 0 {
            clock.set(frame_time);
            scheduler.tick();
            mixer.drain_bus();
        }
        output.push(mixer.next_sample(frame_time));
    }

    tracing::debug!(
        beats = scheduler.beats_fired(),
        end = clock.now(),
        "offline render finished"
    );
    (output, scheduler.beats_fired())
}

/// Render and export the pulse as a mono WAV file
pub fn export_wav(config: &MetronomeConfig, seconds: f64, path: &Path) -> Result<ExportResult> {
    anyhow::ensure!(
        seconds.is_finite() && seconds > 0.0 && seconds <= MAX_DURATION_SECS,
        "export duration must be between 0 and {} seconds, got {}",
        MAX_DURATION_SECS,
        seconds
    );
    let (samples, beats) = render_offline(config, seconds, SAMPLE_RATE);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for sample in &samples {
        let s = (*sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(s)?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    Ok(ExportResult {
        duration_secs: samples.len() as f64 / SAMPLE_RATE as f64,
        samples: samples.len(),
        beats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8000;

    /// Frame indices where a tone begins (silence followed by sound)
    fn onsets(samples: &[f32]) -> Vec<usize> {
        let mut onsets = Vec::new();
        let mut silent_run = usize::MAX;
        for (i, s) in samples.iter().enumerate() {
            if s.abs() > 1e-6 {
                if silent_run > 100 {
                    onsets.push(i);
                }
                silent_run = 0;
            } else {
                silent_run = silent_run.saturating_add(1);
            }
        }
        onsets
    }

    #[test]
    fn tones_land_on_their_beat_frames() {
        let config = MetronomeConfig::default();
        let (samples, beats) = render_offline(&config, 2.0, RATE);

        // Beats at 0.1, 0.584, 1.068, 1.552, 2.035 (queued before the 2s cutoff)
        assert_eq!(beats, 5);
        let found = onsets(&samples);
        assert_eq!(found.len(), 5);
        let interval = 60.0 / 124.0;
        for (k, frame) in found.iter().enumerate() {
            let expected = (0.1 + k as f64 * interval) * RATE as f64;
            // First non-zero sample is the frame after the tone starts (sin(0) = 0)
            assert!((*frame as f64 - expected).abs() <= 2.0, "beat {} at {}", k, frame);
        }
    }

    #[test]
    fn render_has_tail_and_stays_in_range() {
        let config = MetronomeConfig::default();
        let (samples, _) = render_offline(&config, 1.0, RATE);
        assert_eq!(samples.len(), (1.5 * RATE as f64) as usize);
        assert!(samples.iter().all(|s| s.abs() <= 0.6 + 1e-6));
    }

    #[test]
    fn export_writes_a_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.wav");
        let result = export_wav(&MetronomeConfig::default(), 1.0, &path).unwrap();

        assert_eq!(result.beats, 3);
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len() as usize, result.samples);
    }

    #[test]
    fn oversized_export_is_rejected_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.wav");
        let config = MetronomeConfig::default();

        assert!(export_wav(&config, 1e12, &path).is_err());
        assert!(export_wav(&config, MAX_DURATION_SECS + 1.0, &path).is_err());
        assert!(export_wav(&config, f64::INFINITY, &path).is_err());
        assert!(!path.exists());
    }
}
