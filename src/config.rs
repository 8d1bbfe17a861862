use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetronomeError, Result};
use crate::scheduler::beat_interval;
use crate::synth::ToneParams;

/// Session parameters, fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetronomeConfig {
    /// Rate at which the marker steps between star vertices
    pub visual_tempo_bpm: f64,
    /// Rate of the pulse tone
    pub audio_tempo_bpm: f64,
    /// Edge length of the square drawing surface
    pub canvas_size: f64,
    /// Radius of the circle the star vertices sit on
    pub star_radius: f64,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            visual_tempo_bpm: 62.0,
            audio_tempo_bpm: 124.0,
            canvas_size: 1000.0,
            star_radius: 420.0,
        }
    }
}

impl MetronomeConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("visualTempoBpm", self.visual_tempo_bpm),
            ("audioTempoBpm", self.audio_tempo_bpm),
            ("canvasSize", self.canvas_size),
            ("starRadius", self.star_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MetronomeError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        // Tones longer than a beat overlap; allowed, but worth knowing about
        let tone = ToneParams::default().duration as f64;
        if beat_interval(self.audio_tempo_bpm) < tone {
            tracing::warn!(
                audio_bpm = self.audio_tempo_bpm,
                "beat interval is shorter than the {}s tone, pulses will overlap",
                tone
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = MetronomeConfig::default();
        assert_eq!(config.visual_tempo_bpm, 62.0);
        assert_eq!(config.audio_tempo_bpm, 124.0);
        assert_eq!(config.canvas_size, 1000.0);
        assert_eq!(config.star_radius, 420.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: MetronomeConfig =
            serde_json::from_str(r#"{ "audioTempoBpm": 90 }"#).unwrap();
        assert_eq!(config.audio_tempo_bpm, 90.0);
        assert_eq!(config.visual_tempo_bpm, 62.0);
    }

    #[test]
    fn rejects_non_positive_or_non_finite_values() {
        let mut config = MetronomeConfig::default();
        config.visual_tempo_bpm = 0.0;
        assert!(matches!(
            config.validate(),
            Err(MetronomeError::InvalidConfig(_))
        ));

        let mut config = MetronomeConfig::default();
        config.star_radius = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn very_fast_tempo_is_still_accepted() {
        let config = MetronomeConfig {
            audio_tempo_bpm: 600.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metronome.json");
        fs::write(&path, r#"{ "visualTempoBpm": 70, "starRadius": 300 }"#).unwrap();

        let config = MetronomeConfig::load(&path).unwrap();
        assert_eq!(config.visual_tempo_bpm, 70.0);
        assert_eq!(config.star_radius, 300.0);

        fs::write(&path, r#"{ "audioTempoBpm": -5 }"#).unwrap();
        assert!(MetronomeConfig::load(&path).is_err());
    }
}
