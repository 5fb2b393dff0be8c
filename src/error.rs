/// Result type alias for pipeline setup operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors surfaced while building or configuring a pipeline.
///
/// Nothing on the recording path returns these: relay and resolver failures
/// travel through the pipeline as events instead.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("no tokio runtime available to host relay tasks")]
    NoRuntime,

    #[error("invalid flow configuration: {0}")]
    InvalidConfig(String),

    #[error("config load error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl TelemetryError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
