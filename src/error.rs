/// Result alias carrying [`MetronomeError`].
pub type Result<T> = std::result::Result<T, MetronomeError>;

/// Errors raised by the metronome core.
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    /// The host has no default output device, so no audio clock can exist.
    #[error("no audio output device available")]
    NoOutputDevice,
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),
    /// Building, configuring or starting the output stream failed.
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetronomeError {
    pub fn stream<E: std::fmt::Display>(err: E) -> Self {
        Self::Stream(err.to_string())
    }
}
