//! GPU and transcode format definitions
//!
//! This module defines the GPU texture formats the host runtime samples from
//! and the block formats the native transcoder can produce.

use bitflags::bitflags;
use ktx_unity_core::KtxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TranscodeError};

/// GPU texture formats
///
/// Names follow Unity's `GraphicsFormat` enum. Only the formats a transcode
/// target can be uploaded to are listed.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GraphicsFormat {
    // Uncompressed formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNorm,
    R5G6B5_UNormPack16,
    B5G6R5_UNormPack16,
    R4G4B4A4_UNormPack16,

    // BC formats
    RGBA_DXT1_SRGB,
    RGBA_DXT1_UNorm,
    RGBA_DXT5_SRGB,
    RGBA_DXT5_UNorm,
    R_BC4_UNorm,
    RG_BC5_UNorm,
    RGBA_BC7_SRGB,
    RGBA_BC7_UNorm,

    // PVRTC formats
    RGB_PVRTC_4Bpp_SRGB,
    RGB_PVRTC_4Bpp_UNorm,
    RGBA_PVRTC_4Bpp_SRGB,
    RGBA_PVRTC_4Bpp_UNorm,

    // ETC/EAC formats
    RGB_ETC_UNorm,
    RGB_ETC2_SRGB,
    RGB_ETC2_UNorm,
    RGBA_ETC2_SRGB,
    RGBA_ETC2_UNorm,
    R_EAC_UNorm,
    RG_EAC_UNorm,

    // ASTC formats
    RGBA_ASTC4X4_SRGB,
    RGBA_ASTC4X4_UNorm,
}

/// GPU format capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphicsFormatInfo {
    pub name: &'static str,
    pub bits_per_pixel: u32,
    pub block_size: (u32, u32), // (width, height) in pixels
    pub compressed: bool,
    pub has_alpha: bool,
    pub srgb: bool,
}

impl GraphicsFormatInfo {
    const fn new(
        name: &'static str,
        bits_per_pixel: u32,
        block_size: (u32, u32),
        has_alpha: bool,
        srgb: bool,
    ) -> Self {
        Self {
            name,
            bits_per_pixel,
            block_size,
            compressed: block_size.0 > 1,
            has_alpha,
            srgb,
        }
    }
}

impl GraphicsFormat {
    /// Every known GPU format, in declaration order
    pub const ALL: &'static [GraphicsFormat] = &[
        GraphicsFormat::R8G8B8A8_SRGB,
        GraphicsFormat::R8G8B8A8_UNorm,
        GraphicsFormat::R5G6B5_UNormPack16,
        GraphicsFormat::B5G6R5_UNormPack16,
        GraphicsFormat::R4G4B4A4_UNormPack16,
        GraphicsFormat::RGBA_DXT1_SRGB,
        GraphicsFormat::RGBA_DXT1_UNorm,
        GraphicsFormat::RGBA_DXT5_SRGB,
        GraphicsFormat::RGBA_DXT5_UNorm,
        GraphicsFormat::R_BC4_UNorm,
        GraphicsFormat::RG_BC5_UNorm,
        GraphicsFormat::RGBA_BC7_SRGB,
        GraphicsFormat::RGBA_BC7_UNorm,
        GraphicsFormat::RGB_PVRTC_4Bpp_SRGB,
        GraphicsFormat::RGB_PVRTC_4Bpp_UNorm,
        GraphicsFormat::RGBA_PVRTC_4Bpp_SRGB,
        GraphicsFormat::RGBA_PVRTC_4Bpp_UNorm,
        GraphicsFormat::RGB_ETC_UNorm,
        GraphicsFormat::RGB_ETC2_SRGB,
        GraphicsFormat::RGB_ETC2_UNorm,
        GraphicsFormat::RGBA_ETC2_SRGB,
        GraphicsFormat::RGBA_ETC2_UNorm,
        GraphicsFormat::R_EAC_UNorm,
        GraphicsFormat::RG_EAC_UNorm,
        GraphicsFormat::RGBA_ASTC4X4_SRGB,
        GraphicsFormat::RGBA_ASTC4X4_UNorm,
    ];

    /// Get format information
    pub fn info(&self) -> GraphicsFormatInfo {
        use GraphicsFormat::*;
        match self {
            R8G8B8A8_SRGB => GraphicsFormatInfo::new("R8G8B8A8_SRGB", 32, (1, 1), true, true),
            R8G8B8A8_UNorm => GraphicsFormatInfo::new("R8G8B8A8_UNorm", 32, (1, 1), true, false),
            R5G6B5_UNormPack16 => {
                GraphicsFormatInfo::new("R5G6B5_UNormPack16", 16, (1, 1), false, false)
            }
            B5G6R5_UNormPack16 => {
                GraphicsFormatInfo::new("B5G6R5_UNormPack16", 16, (1, 1), false, false)
            }
            R4G4B4A4_UNormPack16 => {
                GraphicsFormatInfo::new("R4G4B4A4_UNormPack16", 16, (1, 1), true, false)
            }
            RGBA_DXT1_SRGB => GraphicsFormatInfo::new("RGBA_DXT1_SRGB", 4, (4, 4), false, true),
            RGBA_DXT1_UNorm => GraphicsFormatInfo::new("RGBA_DXT1_UNorm", 4, (4, 4), false, false),
            RGBA_DXT5_SRGB => GraphicsFormatInfo::new("RGBA_DXT5_SRGB", 8, (4, 4), true, true),
            RGBA_DXT5_UNorm => GraphicsFormatInfo::new("RGBA_DXT5_UNorm", 8, (4, 4), true, false),
            R_BC4_UNorm => GraphicsFormatInfo::new("R_BC4_UNorm", 4, (4, 4), false, false),
            RG_BC5_UNorm => GraphicsFormatInfo::new("RG_BC5_UNorm", 8, (4, 4), false, false),
            RGBA_BC7_SRGB => GraphicsFormatInfo::new("RGBA_BC7_SRGB", 8, (4, 4), true, true),
            RGBA_BC7_UNorm => GraphicsFormatInfo::new("RGBA_BC7_UNorm", 8, (4, 4), true, false),
            RGB_PVRTC_4Bpp_SRGB => {
                GraphicsFormatInfo::new("RGB_PVRTC_4Bpp_SRGB", 4, (4, 4), false, true)
            }
            RGB_PVRTC_4Bpp_UNorm => {
                GraphicsFormatInfo::new("RGB_PVRTC_4Bpp_UNorm", 4, (4, 4), false, false)
            }
            RGBA_PVRTC_4Bpp_SRGB => {
                GraphicsFormatInfo::new("RGBA_PVRTC_4Bpp_SRGB", 4, (4, 4), true, true)
            }
            RGBA_PVRTC_4Bpp_UNorm => {
                GraphicsFormatInfo::new("RGBA_PVRTC_4Bpp_UNorm", 4, (4, 4), true, false)
            }
            RGB_ETC_UNorm => GraphicsFormatInfo::new("RGB_ETC_UNorm", 4, (4, 4), false, false),
            RGB_ETC2_SRGB => GraphicsFormatInfo::new("RGB_ETC2_SRGB", 4, (4, 4), false, true),
            RGB_ETC2_UNorm => GraphicsFormatInfo::new("RGB_ETC2_UNorm", 4, (4, 4), false, false),
            RGBA_ETC2_SRGB => GraphicsFormatInfo::new("RGBA_ETC2_SRGB", 8, (4, 4), true, true),
            RGBA_ETC2_UNorm => GraphicsFormatInfo::new("RGBA_ETC2_UNorm", 8, (4, 4), true, false),
            R_EAC_UNorm => GraphicsFormatInfo::new("R_EAC_UNorm", 4, (4, 4), false, false),
            RG_EAC_UNorm => GraphicsFormatInfo::new("RG_EAC_UNorm", 8, (4, 4), false, false),
            RGBA_ASTC4X4_SRGB => {
                GraphicsFormatInfo::new("RGBA_ASTC4X4_SRGB", 8, (4, 4), true, true)
            }
            RGBA_ASTC4X4_UNorm => {
                GraphicsFormatInfo::new("RGBA_ASTC4X4_UNorm", 8, (4, 4), true, false)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn is_compressed(&self) -> bool {
        self.info().compressed
    }

    pub fn is_srgb(&self) -> bool {
        self.info().srgb
    }
}

impl fmt::Display for GraphicsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphicsFormat {
    type Err = TranscodeError;

    /// Parse a format by name, ignoring ASCII case
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        GraphicsFormat::ALL
            .iter()
            .copied()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| KtxError::parse(format!("Unknown graphics format: {}", s)).into())
    }
}

/// Output formats of the native transcoder
///
/// Values match the native library's `transcoder_texture_format` enum and are
/// passed across the FFI boundary unchanged.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TranscodeFormat {
    ETC1_RGB = 0,
    ETC2_RGBA = 1,
    BC1_RGB = 2,
    BC3_RGBA = 3,
    BC4_R = 4,
    BC5_RG = 5,
    BC7_RGBA = 6,
    PVRTC1_4_RGB = 8,
    PVRTC1_4_RGBA = 9,
    ASTC_4x4_RGBA = 10,
    ATC_RGB = 11,
    ATC_RGBA = 12,
    RGBA32 = 13,
    RGB565 = 14,
    BGR565 = 15,
    RGBA4444 = 16,
    FXT1_RGB = 17,
    PVRTC2_4_RGB = 18,
    PVRTC2_4_RGBA = 19,
    ETC2_EAC_R11 = 20,
    ETC2_EAC_RG11 = 21,
}

impl TryFrom<u32> for TranscodeFormat {
    type Error = TranscodeError;

    fn try_from(value: u32) -> Result<Self> {
        let format = match value {
            0 => TranscodeFormat::ETC1_RGB,
            1 => TranscodeFormat::ETC2_RGBA,
            2 => TranscodeFormat::BC1_RGB,
            3 => TranscodeFormat::BC3_RGBA,
            4 => TranscodeFormat::BC4_R,
            5 => TranscodeFormat::BC5_RG,
            6 => TranscodeFormat::BC7_RGBA,
            8 => TranscodeFormat::PVRTC1_4_RGB,
            9 => TranscodeFormat::PVRTC1_4_RGBA,
            10 => TranscodeFormat::ASTC_4x4_RGBA,
            11 => TranscodeFormat::ATC_RGB,
            12 => TranscodeFormat::ATC_RGBA,
            13 => TranscodeFormat::RGBA32,
            14 => TranscodeFormat::RGB565,
            15 => TranscodeFormat::BGR565,
            16 => TranscodeFormat::RGBA4444,
            17 => TranscodeFormat::FXT1_RGB,
            18 => TranscodeFormat::PVRTC2_4_RGB,
            19 => TranscodeFormat::PVRTC2_4_RGBA,
            20 => TranscodeFormat::ETC2_EAC_R11,
            21 => TranscodeFormat::ETC2_EAC_RG11,
            other => {
                return Err(TranscodeError::unsupported_format(format!(
                    "Unknown transcode format value: {}",
                    other
                )));
            }
        };
        Ok(format)
    }
}

impl TranscodeFormat {
    /// Numeric value handed to the native transcoder
    pub fn as_raw(&self) -> u32 {
        *self as u32
    }

    /// Check if the output keeps an alpha channel
    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            TranscodeFormat::ETC2_RGBA
                | TranscodeFormat::BC3_RGBA
                | TranscodeFormat::BC7_RGBA
                | TranscodeFormat::PVRTC1_4_RGBA
                | TranscodeFormat::ASTC_4x4_RGBA
                | TranscodeFormat::ATC_RGBA
                | TranscodeFormat::RGBA32
                | TranscodeFormat::RGBA4444
                | TranscodeFormat::PVRTC2_4_RGBA
        )
    }

    /// Check if the output is raw pixels rather than blocks
    pub fn is_uncompressed(&self) -> bool {
        matches!(
            self,
            TranscodeFormat::RGBA32
                | TranscodeFormat::RGB565
                | TranscodeFormat::BGR565
                | TranscodeFormat::RGBA4444
        )
    }

    /// Bytes per block for block formats, bytes per pixel otherwise
    pub fn bytes_per_block(&self) -> u32 {
        match self {
            TranscodeFormat::RGBA32 => 4,
            TranscodeFormat::RGB565 | TranscodeFormat::BGR565 | TranscodeFormat::RGBA4444 => 2,
            TranscodeFormat::ETC1_RGB
            | TranscodeFormat::BC1_RGB
            | TranscodeFormat::BC4_R
            | TranscodeFormat::PVRTC1_4_RGB
            | TranscodeFormat::PVRTC1_4_RGBA
            | TranscodeFormat::ATC_RGB
            | TranscodeFormat::PVRTC2_4_RGB
            | TranscodeFormat::PVRTC2_4_RGBA
            | TranscodeFormat::ETC2_EAC_R11 => 8,
            TranscodeFormat::ETC2_RGBA
            | TranscodeFormat::BC3_RGBA
            | TranscodeFormat::BC5_RG
            | TranscodeFormat::BC7_RGBA
            | TranscodeFormat::ASTC_4x4_RGBA
            | TranscodeFormat::ATC_RGBA
            | TranscodeFormat::FXT1_RGB
            | TranscodeFormat::ETC2_EAC_RG11 => 16,
        }
    }

    /// Block footprint in pixels
    pub fn block_size(&self) -> (u32, u32) {
        match self {
            _ if self.is_uncompressed() => (1, 1),
            TranscodeFormat::FXT1_RGB => (8, 4),
            _ => (4, 4),
        }
    }

    /// Get expected transcoded size for given dimensions
    ///
    /// Returns `None` if the size does not fit in a `u64`.
    pub fn calculate_data_size(&self, width: u32, height: u32) -> Option<u64> {
        let bytes_per_block = u64::from(self.bytes_per_block());
        if self.is_uncompressed() {
            return u64::from(width)
                .checked_mul(u64::from(height))?
                .checked_mul(bytes_per_block);
        }

        let (block_w, block_h) = self.block_size();
        let (width, height) = match self {
            // PVRTC1 needs at least 8x8 pixels worth of blocks
            TranscodeFormat::PVRTC1_4_RGB | TranscodeFormat::PVRTC1_4_RGBA => {
                (width.max(8), height.max(8))
            }
            _ => (width, height),
        };
        let blocks_x = u64::from(width.div_ceil(block_w));
        let blocks_y = u64::from(height.div_ceil(block_h));
        blocks_x.checked_mul(blocks_y)?.checked_mul(bytes_per_block)
    }
}

impl fmt::Display for TranscodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    /// Decode flags forwarded to the native transcoder
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TranscodeFlags: u32 {
        const PVRTC_DECODE_TO_NEXT_POW2 = 2;
        const TRANSCODE_ALPHA_DATA_TO_OPAQUE_FORMATS = 4;
        const BC1_FORBID_THREE_COLOR_BLOCKS = 8;
        const OUTPUT_HAS_ALPHA_INDICES = 16;
        const HIGH_QUALITY = 32;
    }
}

impl Default for TranscodeFlags {
    fn default() -> Self {
        Self::empty()
    }
}
