//! Error types shared across Reframe crates.

/// Top-level error type for Reframe operations.
#[derive(Debug, thiserror::Error)]
pub enum ReframeError {
    #[error("Invalid aspect ratio {input:?}: {reason}")]
    InvalidAspectRatio { input: String, reason: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Frame source not ready: {message}")]
    NotReady { message: String },

    #[error("Degenerate crop geometry: {width}x{height}")]
    DegenerateGeometry { width: f64, height: f64 },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Preview error: {message}")]
    Preview { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReframeError.
pub type ReframeResult<T> = Result<T, ReframeError>;

impl ReframeError {
    pub fn invalid_aspect_ratio(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAspectRatio {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady {
            message: msg.into(),
        }
    }

    pub fn degenerate(width: f64, height: f64) -> Self {
        Self::DegenerateGeometry { width, height }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn preview(msg: impl Into<String>) -> Self {
        Self::Preview {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the error only means "skip this tick".
    ///
    /// Sampling ticks recover from these locally; they never end a session.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::NotReady { .. } | Self::DegenerateGeometry { .. })
    }
}
