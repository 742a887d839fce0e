//! Error types for format selection and transcoding

use ktx_unity_core::{ErrorCode, KtxError, TextureFeatures};
use thiserror::Error;

use crate::formats::TranscodeFormat;

/// Result type for transcode operations
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Errors that can occur while selecting a format and transcoding a texture
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// No supported GPU format, even after dropping the alpha requirement
    #[error("No supported GPU format for features {features}")]
    UnsupportedFormat { features: TextureFeatures },

    /// The native transcoder rejected the chosen target
    #[error("Transcoding to {format} failed: {message}")]
    TranscodeFailed {
        format: TranscodeFormat,
        message: String,
    },

    /// The native library could not open the buffer
    #[error("Failed to open texture: {0}")]
    OpenFailed(String),

    /// Container version not handled (KTX 1.x)
    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(String),

    /// KTX payload is not Basis super-compressed
    #[error("Texture is not super-compressed")]
    NotSuperCompressed,

    /// Generic load failure reported by the native boundary
    #[error("Loading failed: {0}")]
    LoadingFailed(String),

    /// Image or level index outside the texture
    #[error("Invalid image/level index: image {image}, level {level}")]
    InvalidIndex { image: u32, level: u32 },

    /// Host runtime failed to create or fill the texture object
    #[error("Texture upload failed: {0}")]
    Upload(String),

    /// Every pooled transcoder is in use
    #[error("No transcoder available")]
    NoTranscoderAvailable,

    /// Invalid configuration or profile
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from the core crate
    #[error(transparent)]
    Core(#[from] KtxError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Create an unsupported format error for the given feature mask
    pub fn unsupported_features(features: TextureFeatures) -> Self {
        Self::UnsupportedFormat { features }
    }

    /// Create an unsupported format error from a free-form message
    ///
    /// Used for unknown enum values, which carry no feature mask.
    pub fn unsupported_format<S: Into<String>>(msg: S) -> Self {
        Self::Core(KtxError::format(msg))
    }

    /// Create a transcode failure
    pub fn transcode_failed<S: Into<String>>(format: TranscodeFormat, msg: S) -> Self {
        Self::TranscodeFailed {
            format,
            message: msg.into(),
        }
    }

    /// Create an open failure
    pub fn open_failed<S: Into<String>>(msg: S) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a loading failure
    pub fn loading_failed<S: Into<String>>(msg: S) -> Self {
        Self::LoadingFailed(msg.into())
    }

    /// Create an upload failure
    pub fn upload<S: Into<String>>(msg: S) -> Self {
        Self::Upload(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Status code surfaced to the host application
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::TranscodeFailed { .. } => ErrorCode::TranscodeFailed,
            Self::OpenFailed(_) | Self::Io(_) => ErrorCode::OpenUriFailed,
            Self::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            Self::NotSuperCompressed => ErrorCode::NotSuperCompressed,
            Self::Core(KtxError::Format(_)) => ErrorCode::UnsupportedFormat,
            Self::LoadingFailed(_)
            | Self::InvalidIndex { .. }
            | Self::Upload(_)
            | Self::NoTranscoderAvailable
            | Self::Config(_)
            | Self::Core(_) => ErrorCode::LoadingFailed,
        }
    }

    /// Check if retrying the same request later could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoTranscoderAvailable | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = TranscodeError::unsupported_features(TextureFeatures::ALPHA_CHANNEL);
        assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
        assert_eq!(
            err.to_string(),
            "No supported GPU format for features ALPHA_CHANNEL"
        );

        let err = TranscodeError::transcode_failed(TranscodeFormat::BC7_RGBA, "bad level");
        assert_eq!(err.code(), ErrorCode::TranscodeFailed);
        assert!(err.to_string().contains("BC7_RGBA"));

        assert_eq!(
            TranscodeError::NotSuperCompressed.code(),
            ErrorCode::NotSuperCompressed
        );
        assert_eq!(
            TranscodeError::InvalidIndex { image: 0, level: 9 }.code(),
            ErrorCode::LoadingFailed
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(TranscodeError::NoTranscoderAvailable.is_recoverable());
        assert!(!TranscodeError::NotSuperCompressed.is_recoverable());
    }
}
