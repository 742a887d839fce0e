//! Load options and runtime profiles
//!
//! A [`RuntimeProfile`] describes which GPU formats a target platform can
//! sample. Profiles stand in for a live GPU, so selection can be planned
//! offline or tested without a device.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TranscodeError};
use crate::formats::{GraphicsFormat, TranscodeFlags};
use crate::selector::FormatSupport;

/// Options for loading a single texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Sample in linear color space instead of sRGB
    pub linear: bool,
    /// Image (layer, face or slice) to load
    pub image_index: u32,
    /// First mip level to load
    pub level_index: u32,
    /// Load all levels from `level_index` down
    pub mip_chain: bool,
    /// Flags forwarded to the native transcoder
    pub transcode_flags: TranscodeFlags,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            linear: false,
            image_index: 0,
            level_index: 0,
            mip_chain: true,
            transcode_flags: TranscodeFlags::empty(),
        }
    }
}

impl LoadOptions {
    /// Options for data textures such as normal maps
    pub fn linear() -> Self {
        Self {
            linear: true,
            ..Self::default()
        }
    }

    /// Only the top level, no mip chain
    pub fn single_level(level_index: u32) -> Self {
        Self {
            level_index,
            mip_chain: false,
            ..Self::default()
        }
    }

    /// Slower transcoding with better output
    pub fn high_quality() -> Self {
        Self {
            transcode_flags: TranscodeFlags::HIGH_QUALITY,
            ..Self::default()
        }
    }
}

/// GPU format support of a target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeProfile {
    pub name: String,
    pub supported_formats: Vec<GraphicsFormat>,
    /// Project color space is linear
    #[serde(default)]
    pub linear: bool,
}

impl RuntimeProfile {
    /// Names accepted by [`preset`](Self::preset)
    pub const PRESETS: &'static [&'static str] =
        &["desktop", "android", "ios", "webgl", "uncompressed"];

    pub fn new<S: Into<String>>(name: S, supported_formats: Vec<GraphicsFormat>) -> Self {
        Self {
            name: name.into(),
            supported_formats,
            linear: false,
        }
    }

    /// Desktop GPUs with BC support
    pub fn desktop() -> Self {
        use GraphicsFormat::*;
        Self::new(
            "desktop",
            vec![
                RGBA_DXT1_SRGB,
                RGBA_DXT1_UNorm,
                RGBA_DXT5_SRGB,
                RGBA_DXT5_UNorm,
                R_BC4_UNorm,
                RG_BC5_UNorm,
                RGBA_BC7_SRGB,
                RGBA_BC7_UNorm,
                B5G6R5_UNormPack16,
                R8G8B8A8_SRGB,
                R8G8B8A8_UNorm,
            ],
        )
    }

    /// OpenGL ES 3 / Vulkan Android devices
    pub fn android() -> Self {
        use GraphicsFormat::*;
        Self::new(
            "android",
            vec![
                RGB_ETC_UNorm,
                RGB_ETC2_SRGB,
                RGB_ETC2_UNorm,
                RGBA_ETC2_SRGB,
                RGBA_ETC2_UNorm,
                R_EAC_UNorm,
                RG_EAC_UNorm,
                RGBA_ASTC4X4_SRGB,
                RGBA_ASTC4X4_UNorm,
                R5G6B5_UNormPack16,
                R4G4B4A4_UNormPack16,
                R8G8B8A8_SRGB,
                R8G8B8A8_UNorm,
            ],
        )
    }

    /// Apple GPUs
    pub fn ios() -> Self {
        use GraphicsFormat::*;
        Self::new(
            "ios",
            vec![
                RGB_PVRTC_4Bpp_SRGB,
                RGB_PVRTC_4Bpp_UNorm,
                RGBA_PVRTC_4Bpp_SRGB,
                RGBA_PVRTC_4Bpp_UNorm,
                RGBA_ASTC4X4_SRGB,
                RGBA_ASTC4X4_UNorm,
                RGB_ETC2_SRGB,
                RGBA_ETC2_SRGB,
                RGBA_ETC2_UNorm,
                R5G6B5_UNormPack16,
                R4G4B4A4_UNormPack16,
                R8G8B8A8_SRGB,
                R8G8B8A8_UNorm,
            ],
        )
    }

    /// WebGL 2 with the S3TC extension
    pub fn webgl() -> Self {
        use GraphicsFormat::*;
        Self::new(
            "webgl",
            vec![
                RGBA_DXT1_SRGB,
                RGBA_DXT1_UNorm,
                RGBA_DXT5_SRGB,
                RGBA_DXT5_UNorm,
                R5G6B5_UNormPack16,
                R4G4B4A4_UNormPack16,
                R8G8B8A8_SRGB,
                R8G8B8A8_UNorm,
            ],
        )
    }

    /// No block compression at all
    pub fn uncompressed() -> Self {
        use GraphicsFormat::*;
        Self::new(
            "uncompressed",
            vec![
                R5G6B5_UNormPack16,
                R4G4B4A4_UNormPack16,
                R8G8B8A8_SRGB,
                R8G8B8A8_UNorm,
            ],
        )
    }

    /// Look up a built-in profile by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "desktop" => Some(Self::desktop()),
            "android" => Some(Self::android()),
            "ios" => Some(Self::ios()),
            "webgl" => Some(Self::webgl()),
            "uncompressed" => Some(Self::uncompressed()),
            _ => None,
        }
    }

    /// Parse a profile from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let profile: Self = serde_yaml::from_str(yaml)
            .map_err(|e| TranscodeError::config(format!("Invalid runtime profile: {}", e)))?;
        if profile.supported_formats.is_empty() {
            return Err(TranscodeError::config(format!(
                "Runtime profile '{}' lists no supported formats",
                profile.name
            )));
        }
        Ok(profile)
    }

    /// Load a profile from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| TranscodeError::config(format!("Failed to serialize profile: {}", e)))
    }

    pub fn supports(&self, format: GraphicsFormat) -> bool {
        self.supported_formats.contains(&format)
    }
}

impl FormatSupport for RuntimeProfile {
    fn is_supported(&self, format: GraphicsFormat) -> bool {
        self.supports(format)
    }
}
