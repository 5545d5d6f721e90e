/// Result alias that carries the custom [`VisualiserError`] type.
pub type Result<T> = std::result::Result<T, VisualiserError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VisualiserError {
    /// No usable sample data. Fatal at pipeline startup.
    #[error("failed to load samples: {0}")]
    Load(String),
    /// The analyzer cannot extract a window from the buffer. Fatal for the
    /// tick that hit it.
    #[error("spectrum analysis failed: {0}")]
    Analysis(String),
    /// A configuration value is outside its valid domain.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The FFT backend rejected the buffers it was handed.
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Config or recording (de)serialisation failure.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VisualiserError {
    pub fn load<T: Into<String>>(msg: T) -> Self {
        Self::Load(msg.into())
    }

    pub fn analysis<T: Into<String>>(msg: T) -> Self {
        Self::Analysis(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}
