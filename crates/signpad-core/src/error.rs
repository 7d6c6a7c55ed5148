//! Error types for the capture engine.

use thiserror::Error;

/// Errors surfaced by the signature pad.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("No usable input mechanism in this environment")]
    UnsupportedEnvironment,
    #[error("Missing drawing surface: {0}")]
    MissingSurface(&'static str),
    #[error("Missing platform binding")]
    MissingPlatform,
    #[error("Invalid stroke color: {0}")]
    InvalidColor(String),
    #[error("Invalid stroke thickness: {0}")]
    InvalidThickness(f64),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Signature pad has been destroyed")]
    Destroyed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignatureError {
    /// Stable machine-readable code, shared with the web facade.
    pub fn code(&self) -> &'static str {
        match self {
            SignatureError::UnsupportedEnvironment => "UNSUPPORTED_ENV",
            SignatureError::MissingSurface(_) => "MISSING_SURFACE",
            SignatureError::MissingPlatform => "MISSING_PLATFORM",
            SignatureError::InvalidColor(_) => "INVALID_COLOR",
            SignatureError::InvalidThickness(_) => "INVALID_THICKNESS",
            SignatureError::InvalidConfig(_) => "INVALID_CONFIG",
            SignatureError::Destroyed => "DESTROYED",
            SignatureError::Serialization(_) => "SERIALIZATION",
            SignatureError::Io(_) => "IO",
        }
    }
}

/// Result type for signature pad operations.
pub type SignatureResult<T> = Result<T, SignatureError>;

/// Failures of best-effort platform calls. Never propagated out of the engine.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Pointer capture failed for pointer {pointer_id}: {message}")]
    PointerCapture { pointer_id: i32, message: String },
    #[error("Platform error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_env_code() {
        let err = SignatureError::UnsupportedEnvironment;
        assert_eq!(err.code(), "UNSUPPORTED_ENV");
        assert!(err.to_string().contains("input"));
    }

    #[test]
    fn test_serde_error_converts() {
        let parse = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SignatureError = parse.into();
        assert_eq!(err.code(), "SERIALIZATION");
    }
}
