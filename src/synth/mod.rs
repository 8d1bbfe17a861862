pub mod tone;

pub use tone::{ScheduledTone, ToneParams, ToneSynth, ToneVoice};
