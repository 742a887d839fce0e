//! Texture orientation
//!
//! KTX textures declare the direction of their axes. Unity expects GPU textures
//! to be X=right and Y=up, so anything else has to be mirrored by the consumer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{KtxError, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TextureOrientation: u8 {
        const X_LEFT = 0b001;
        const Y_UP = 0b010;
        // Not used at the moment
        const Z_IN = 0b100;
    }
}

impl TextureOrientation {
    /// X right, Y down
    pub const KTX_DEFAULT: Self = Self::empty();
    pub const UNITY_DEFAULT: Self = Self::Y_UP;

    /// True if the texture has to be applied mirrored horizontally
    pub fn is_x_flipped(&self) -> bool {
        self.contains(Self::X_LEFT)
    }

    /// True if the texture has to be applied mirrored vertically
    pub fn is_y_flipped(&self) -> bool {
        !self.contains(Self::Y_UP)
    }

    /// Parse a `KTXorientation` metadata value such as `"rd"` or `"ruo"`.
    pub fn from_ktx_metadata(value: &str) -> Result<Self> {
        let value = value.trim_end_matches('\0');
        let mut orientation = Self::KTX_DEFAULT;
        let mut chars = value.chars();

        match chars.next() {
            Some('l') => orientation |= Self::X_LEFT,
            Some('r') => {}
            other => {
                return Err(KtxError::parse(format!(
                    "Invalid x orientation {:?} in {:?}",
                    other, value
                )));
            }
        }

        match chars.next() {
            Some('u') => orientation |= Self::Y_UP,
            Some('d') | None => {}
            Some(other) => {
                return Err(KtxError::parse(format!(
                    "Invalid y orientation '{}' in {:?}",
                    other, value
                )));
            }
        }

        match chars.next() {
            Some('i') => orientation |= Self::Z_IN,
            Some('o') | None => {}
            Some(other) => {
                return Err(KtxError::parse(format!(
                    "Invalid z orientation '{}' in {:?}",
                    other, value
                )));
            }
        }

        Ok(orientation)
    }
}

impl Default for TextureOrientation {
    fn default() -> Self {
        Self::KTX_DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_detection() {
        assert!(!TextureOrientation::UNITY_DEFAULT.is_x_flipped());
        assert!(!TextureOrientation::UNITY_DEFAULT.is_y_flipped());

        assert!(!TextureOrientation::KTX_DEFAULT.is_x_flipped());
        assert!(TextureOrientation::KTX_DEFAULT.is_y_flipped());

        let mirrored = TextureOrientation::X_LEFT | TextureOrientation::Y_UP;
        assert!(mirrored.is_x_flipped());
        assert!(!mirrored.is_y_flipped());
    }

    #[test]
    fn test_metadata_parsing() {
        assert_eq!(
            TextureOrientation::from_ktx_metadata("rd").unwrap(),
            TextureOrientation::KTX_DEFAULT
        );
        assert_eq!(
            TextureOrientation::from_ktx_metadata("ru\0").unwrap(),
            TextureOrientation::UNITY_DEFAULT
        );
        assert_eq!(
            TextureOrientation::from_ktx_metadata("lui").unwrap(),
            TextureOrientation::X_LEFT | TextureOrientation::Y_UP | TextureOrientation::Z_IN
        );
        assert!(TextureOrientation::from_ktx_metadata("xd").is_err());
        assert!(TextureOrientation::from_ktx_metadata("rq").is_err());
    }
}
