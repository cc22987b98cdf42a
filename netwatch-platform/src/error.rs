//! Error types for the platform seam

/// Result type for platform operations.
///
/// Convenience alias using [`PlatformError`] as the error type, used
/// throughout the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error type for connectivity-source operations.
///
/// Registration is the only operation that can fail while observing; the
/// remaining variants cover backend setup (endpoint parsing, socket errors).
/// Point queries never error; the absence of a network is data, not a
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The platform refused or could not establish a callback registration
    #[error("callback registration failed: {message}")]
    Registration { message: String },

    /// A probe endpoint could not be parsed as a socket address
    #[error("invalid probe endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },

    /// IO errors from the probe backend
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PlatformError {
    /// Create a registration error with a descriptive message.
    ///
    /// # Arguments
    /// * `message` - Why the registration was refused
    pub fn registration<S: Into<String>>(message: S) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }
}
