//! Image feature flags used for GPU format negotiation
//!
//! An image is reduced to a [`TextureFeatures`] mask describing its
//! irregularities (alpha, non-power-of-two, ...). Catalog entries carry a mask of
//! the same type as their requirement.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Feature mask shared by image features and catalog requirements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct TextureFeatures: u32 {
        /// The image carries an alpha channel that must be preserved.
        const ALPHA_CHANNEL = 1 << 0;
        /// Width or height is not a power of two.
        const NON_POWER_OF_TWO = 1 << 1;
        /// Width or height is not a multiple of four.
        const NON_MULTIPLE_OF_FOUR = 1 << 2;
        /// Width differs from height.
        const NON_SQUARE = 1 << 3;
        /// Sampling should happen in linear (non-sRGB) color space.
        const LINEAR = 1 << 4;
    }
}

impl TextureFeatures {
    pub const NONE: Self = Self::empty();

    /// Requirement test: every flag of `self` is present in `mask`.
    ///
    /// Absent flags are not checked, so a requirement of [`TextureFeatures::NONE`]
    /// is satisfied by any mask.
    pub fn satisfied_by(self, mask: TextureFeatures) -> bool {
        (self & mask) == self
    }
}

impl Default for TextureFeatures {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for TextureFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}

/// Per-image features, derived once from immutable image metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageFeatures {
    pub has_alpha: bool,
    pub is_power_of_two: bool,
    pub is_multiple_of_four: bool,
    pub is_square: bool,
    pub is_linear: bool,
}

impl Default for ImageFeatures {
    /// A square, power-of-two, opaque sRGB image.
    fn default() -> Self {
        Self {
            has_alpha: false,
            is_power_of_two: true,
            is_multiple_of_four: true,
            is_square: true,
            is_linear: false,
        }
    }
}

impl ImageFeatures {
    /// Derive features from level dimensions
    pub fn from_dimensions(width: u32, height: u32, has_alpha: bool, linear: bool) -> Self {
        Self {
            has_alpha,
            is_power_of_two: is_power_of_two(width) && is_power_of_two(height),
            is_multiple_of_four: is_multiple_of_four(width) && is_multiple_of_four(height),
            is_square: width == height,
            is_linear: linear,
        }
    }

    /// Canonical mask used as cache key and match input
    pub fn mask(&self) -> TextureFeatures {
        let mut mask = TextureFeatures::NONE;
        if self.has_alpha {
            mask |= TextureFeatures::ALPHA_CHANNEL;
        }
        if !self.is_power_of_two {
            mask |= TextureFeatures::NON_POWER_OF_TWO;
        }
        if !self.is_multiple_of_four {
            mask |= TextureFeatures::NON_MULTIPLE_OF_FOUR;
        }
        if !self.is_square {
            mask |= TextureFeatures::NON_SQUARE;
        }
        if self.is_linear {
            mask |= TextureFeatures::LINEAR;
        }
        mask
    }

    /// Same features with the alpha requirement dropped
    pub fn without_alpha(&self) -> Self {
        Self {
            has_alpha: false,
            ..*self
        }
    }
}

impl From<ImageFeatures> for TextureFeatures {
    fn from(features: ImageFeatures) -> Self {
        features.mask()
    }
}

/// Power-of-two test. Zero is not a power of two.
pub fn is_power_of_two(value: u32) -> bool {
    value.is_power_of_two()
}

/// Multiple-of-four test. Zero-sized dimensions never qualify.
pub fn is_multiple_of_four(value: u32) -> bool {
    value != 0 && value % 4 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_helpers() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(12));

        assert!(is_multiple_of_four(4));
        assert!(is_multiple_of_four(12));
        assert!(!is_multiple_of_four(0));
        assert!(!is_multiple_of_four(2));
        assert!(!is_multiple_of_four(30));
    }

    #[test]
    fn test_regular_image_has_empty_mask() {
        let features = ImageFeatures::from_dimensions(256, 256, false, false);
        assert_eq!(features, ImageFeatures::default());
        assert_eq!(features.mask(), TextureFeatures::NONE);
    }

    #[test]
    fn test_irregular_image_mask() {
        let features = ImageFeatures::from_dimensions(30, 20, true, true);
        assert_eq!(
            features.mask(),
            TextureFeatures::ALPHA_CHANNEL
                | TextureFeatures::NON_POWER_OF_TWO
                | TextureFeatures::NON_MULTIPLE_OF_FOUR
                | TextureFeatures::NON_SQUARE
                | TextureFeatures::LINEAR
        );
        assert!(!features.without_alpha().mask().contains(TextureFeatures::ALPHA_CHANNEL));
    }

    #[test]
    fn test_small_power_of_two_is_not_multiple_of_four() {
        let features = ImageFeatures::from_dimensions(2, 2, false, false);
        assert!(features.is_power_of_two);
        assert!(!features.is_multiple_of_four);
        assert_eq!(features.mask(), TextureFeatures::NON_MULTIPLE_OF_FOUR);
    }

    #[test]
    fn test_requirement_matching() {
        let mask = TextureFeatures::ALPHA_CHANNEL | TextureFeatures::NON_SQUARE;
        assert!(TextureFeatures::NONE.satisfied_by(mask));
        assert!(TextureFeatures::ALPHA_CHANNEL.satisfied_by(mask));
        assert!(mask.satisfied_by(mask));
        assert!(!TextureFeatures::LINEAR.satisfied_by(mask));
        assert!(!(TextureFeatures::ALPHA_CHANNEL | TextureFeatures::LINEAR).satisfied_by(mask));
    }

    #[test]
    fn test_mask_display() {
        assert_eq!(TextureFeatures::NONE.to_string(), "None");
        assert_eq!(
            (TextureFeatures::ALPHA_CHANNEL | TextureFeatures::LINEAR).to_string(),
            "ALPHA_CHANNEL|LINEAR"
        );
    }
}
