pub mod bus;
pub mod engine;
pub mod mixer;

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::synth::ScheduledTone;

pub use bus::ToneBus;
pub use engine::CpalBackend;
pub use mixer::ToneMixer;

/// Accepts tones for playback at their scheduled clock time.
pub trait ToneSink {
    fn schedule(&self, tone: ScheduledTone);
}

/// An open output device: the clock it keeps and the sink feeding it.
pub trait AudioOutput {
    fn clock(&self) -> Arc<dyn Clock>;
    fn sink(&self) -> Arc<dyn ToneSink>;
    /// Release the device. Calling it again is a no-op.
    fn close(&mut self);
}

/// Acquires output devices, one per session.
pub trait AudioBackend {
    fn open(&self) -> Result<Box<dyn AudioOutput>>;
}
