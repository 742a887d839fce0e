//! Error types shared by the KTX / Basis Universal crates

use std::io;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, KtxError>;

/// Main error type for the core crate
#[derive(Error, Debug)]
pub enum KtxError {
    /// IO errors when reading texture files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Container or format errors
    #[error("Format error: {0}")]
    Format(String),

    /// Parsing of names, flags or enum values failed
    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl KtxError {
    /// Create a format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format(message.into())
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

/// Outcome codes reported to the host application
///
/// These mirror the status values a loading pipeline surfaces to users,
/// independent of the richer error types used internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    UnsupportedVersion,
    UnsupportedFormat,
    NotSuperCompressed,
    OpenUriFailed,
    LoadingFailed,
    TranscodeFailed,
}

impl ErrorCode {
    /// Human readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::UnsupportedVersion => "Only KTX 2.0 is supported",
            ErrorCode::UnsupportedFormat => "Unsupported format",
            ErrorCode::NotSuperCompressed => "Only super-compressed KTX is supported",
            ErrorCode::OpenUriFailed => "Loading URI failed!",
            ErrorCode::LoadingFailed => "Loading failed!",
            ErrorCode::TranscodeFailed => "Transcoding failed!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = KtxError::format("bad magic");
        assert!(matches!(err, KtxError::Format(_)));
    }

    #[test]
    fn test_error_display() {
        let err = KtxError::parse("unknown graphics format 'RGBA_FOO'");
        let msg = format!("{}", err);
        assert!(msg.contains("RGBA_FOO"));
        assert!(msg.starts_with("Parse error"));
    }

    #[test]
    fn test_error_code_messages() {
        assert_eq!(ErrorCode::Success.message(), "OK");
        assert_eq!(ErrorCode::TranscodeFailed.to_string(), "Transcoding failed!");
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::UnsupportedFormat.is_success());
    }
}
