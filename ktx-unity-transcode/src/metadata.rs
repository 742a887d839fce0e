//! Image and level metadata reported by the transcoder

use ktx_unity_core::{ImageFeatures, is_multiple_of_four, is_power_of_two};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranscodeError};

/// Dimensions of a single mip level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelInfo {
    pub width: u32,
    pub height: u32,
}

impl LevelInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_power_of_two(&self) -> bool {
        is_power_of_two(self.width) && is_power_of_two(self.height)
    }

    pub fn is_multiple_of_four(&self) -> bool {
        is_multiple_of_four(self.width) && is_multiple_of_four(self.height)
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Features used for format selection of this level
    pub fn features(&self, has_alpha: bool, linear: bool) -> ImageFeatures {
        ImageFeatures::from_dimensions(self.width, self.height, has_alpha, linear)
    }
}

/// Mip chain of one image (array layer, face or slice)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub levels: Vec<LevelInfo>,
}

/// Everything known about a texture before transcoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub has_alpha: bool,
    pub images: Vec<ImageInfo>,
}

impl MetaData {
    /// Look up one level, failing with [`TranscodeError::InvalidIndex`]
    pub fn level(&self, image: u32, level: u32) -> Result<&LevelInfo> {
        self.images
            .get(image as usize)
            .and_then(|info| info.levels.get(level as usize))
            .ok_or(TranscodeError::InvalidIndex { image, level })
    }

    pub fn num_images(&self) -> usize {
        self.images.len()
    }

    /// Number of levels of an image, zero if the image does not exist
    pub fn num_levels(&self, image: u32) -> usize {
        self.images
            .get(image as usize)
            .map(|info| info.levels.len())
            .unwrap_or(0)
    }

    /// Selection features for one level
    pub fn features(&self, image: u32, level: u32, linear: bool) -> Result<ImageFeatures> {
        Ok(self.level(image, level)?.features(self.has_alpha, linear))
    }
}
