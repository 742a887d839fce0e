//! Ordered table of candidate (GPU format, transcode format) pairs
//!
//! Each entry carries the feature requirement under which it may be chosen and
//! the image features its GPU format tolerates.
//! Entry order is the selection priority: smaller memory footprint first, then
//! better quality per transcode time among equal footprints. The selector never
//! reorders entries.

use ktx_unity_core::TextureFeatures;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::formats::{GraphicsFormat, TranscodeFormat};

/// Built once per process on first use
static STANDARD_CATALOG: Lazy<Arc<FormatCatalog>> =
    Lazy::new(|| Arc::new(FormatCatalog::build_standard()));

/// PVRTC1 only encodes square power-of-two images
const PVRTC_TOLERANCE: TextureFeatures = TextureFeatures::all()
    .difference(TextureFeatures::NON_POWER_OF_TWO.union(TextureFeatures::NON_SQUARE));

fn tolerates_everything() -> TextureFeatures {
    TextureFeatures::all()
}

/// One candidate transcoding choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatCatalogEntry {
    pub requirement: TextureFeatures,
    /// Image features the GPU format accepts beyond `requirement`
    #[serde(default = "tolerates_everything")]
    pub tolerates: TextureFeatures,
    pub graphics_format: GraphicsFormat,
    pub transcode_format: TranscodeFormat,
}

impl FormatCatalogEntry {
    /// An entry that tolerates any image meeting its requirement
    pub const fn new(
        requirement: TextureFeatures,
        graphics_format: GraphicsFormat,
        transcode_format: TranscodeFormat,
    ) -> Self {
        Self {
            requirement,
            tolerates: TextureFeatures::all(),
            graphics_format,
            transcode_format,
        }
    }

    /// Restrict the image features the entry accepts
    pub const fn with_tolerance(mut self, tolerates: TextureFeatures) -> Self {
        self.tolerates = tolerates;
        self
    }

    /// Entries that keep the alpha channel
    pub fn is_alpha_capable(&self) -> bool {
        self.requirement.contains(TextureFeatures::ALPHA_CHANNEL)
    }

    /// Check the entry against an image feature mask
    ///
    /// The requirement must be met, `(R & M) == R`, and the mask may not carry
    /// a feature that is neither required nor tolerated.
    pub fn matches(&self, mask: TextureFeatures) -> bool {
        self.requirement.satisfied_by(mask)
            && (mask - (self.requirement | self.tolerates)).is_empty()
    }
}

/// Immutable, ordered list of catalog entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCatalog {
    entries: Vec<FormatCatalogEntry>,
}

impl FormatCatalog {
    /// The process-wide default catalog
    pub fn standard() -> Arc<FormatCatalog> {
        Arc::clone(&STANDARD_CATALOG)
    }

    /// Build a catalog with a custom priority order
    pub fn from_entries(entries: Vec<FormatCatalogEntry>) -> Self {
        Self { entries }
    }

    /// All entries in priority order
    pub fn entries(&self) -> &[FormatCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that may be considered for `mask`, in priority order
    ///
    /// Masks with an alpha channel only see alpha-capable entries. Opaque masks
    /// only see the others, since an alpha requirement can never be satisfied
    /// by a mask without alpha.
    pub fn candidates(
        &self,
        mask: TextureFeatures,
    ) -> impl Iterator<Item = &FormatCatalogEntry> + '_ {
        let want_alpha = mask.contains(TextureFeatures::ALPHA_CHANNEL);
        self.entries
            .iter()
            .filter(move |entry| entry.is_alpha_capable() == want_alpha)
    }

    pub fn alpha_entries(&self) -> impl Iterator<Item = &FormatCatalogEntry> + '_ {
        self.entries.iter().filter(|entry| entry.is_alpha_capable())
    }

    pub fn opaque_entries(&self) -> impl Iterator<Item = &FormatCatalogEntry> + '_ {
        self.entries.iter().filter(|entry| !entry.is_alpha_capable())
    }

    /// True if both partitions hold an entry that matches any mask
    ///
    /// Without these a supported runtime could still fail every selection.
    pub fn has_universal_fallbacks(&self) -> bool {
        let opaque = self
            .opaque_entries()
            .any(|entry| entry.requirement.is_empty() && entry.tolerates.is_all());
        let alpha = self.alpha_entries().any(|entry| {
            entry.requirement == TextureFeatures::ALPHA_CHANNEL && entry.tolerates.is_all()
        });
        opaque && alpha
    }

    fn build_standard() -> Self {
        use GraphicsFormat as G;
        use TextureFeatures as F;
        use TranscodeFormat as T;

        let none = F::NONE;
        let alpha = F::ALPHA_CHANNEL;
        let linear = F::LINEAR;
        let alpha_linear = F::ALPHA_CHANNEL | F::LINEAR;

        let entries = vec![
            // Opaque block formats. Block formats need 4x4 aligned sizes, so
            // the 16 bit fallbacks are listed first for unaligned images.
            FormatCatalogEntry::new(F::NON_MULTIPLE_OF_FOUR, G::R5G6B5_UNormPack16, T::RGB565),
            FormatCatalogEntry::new(F::NON_MULTIPLE_OF_FOUR, G::B5G6R5_UNormPack16, T::BGR565),
            FormatCatalogEntry::new(none, G::RGB_ETC_UNorm, T::ETC1_RGB),
            FormatCatalogEntry::new(linear, G::RGBA_DXT1_UNorm, T::BC1_RGB),
            FormatCatalogEntry::new(none, G::RGBA_DXT1_SRGB, T::BC1_RGB),
            FormatCatalogEntry::new(linear, G::RGB_PVRTC_4Bpp_UNorm, T::PVRTC1_4_RGB)
                .with_tolerance(PVRTC_TOLERANCE),
            FormatCatalogEntry::new(none, G::RGB_PVRTC_4Bpp_SRGB, T::PVRTC1_4_RGB)
                .with_tolerance(PVRTC_TOLERANCE),
            // Alpha block formats
            FormatCatalogEntry::new(
                alpha | F::NON_MULTIPLE_OF_FOUR,
                G::R4G4B4A4_UNormPack16,
                T::RGBA4444,
            ),
            FormatCatalogEntry::new(alpha_linear, G::RGBA_ASTC4X4_UNorm, T::ASTC_4x4_RGBA),
            FormatCatalogEntry::new(alpha, G::RGBA_ASTC4X4_SRGB, T::ASTC_4x4_RGBA),
            FormatCatalogEntry::new(alpha_linear, G::RGBA_ETC2_UNorm, T::ETC2_RGBA),
            FormatCatalogEntry::new(alpha, G::RGBA_ETC2_SRGB, T::ETC2_RGBA),
            FormatCatalogEntry::new(alpha_linear, G::RGBA_BC7_UNorm, T::BC7_RGBA),
            FormatCatalogEntry::new(alpha, G::RGBA_BC7_SRGB, T::BC7_RGBA),
            FormatCatalogEntry::new(alpha_linear, G::RGBA_DXT5_UNorm, T::BC3_RGBA),
            FormatCatalogEntry::new(alpha, G::RGBA_DXT5_SRGB, T::BC3_RGBA),
            FormatCatalogEntry::new(alpha_linear, G::RGBA_PVRTC_4Bpp_UNorm, T::PVRTC1_4_RGBA)
                .with_tolerance(PVRTC_TOLERANCE),
            FormatCatalogEntry::new(alpha, G::RGBA_PVRTC_4Bpp_SRGB, T::PVRTC1_4_RGBA)
                .with_tolerance(PVRTC_TOLERANCE),
            // Uncompressed fallbacks
            FormatCatalogEntry::new(none, G::R5G6B5_UNormPack16, T::RGB565),
            FormatCatalogEntry::new(none, G::B5G6R5_UNormPack16, T::BGR565),
            FormatCatalogEntry::new(alpha, G::R4G4B4A4_UNormPack16, T::RGBA4444),
            FormatCatalogEntry::new(alpha_linear, G::R8G8B8A8_UNorm, T::RGBA32),
            FormatCatalogEntry::new(alpha, G::R8G8B8A8_SRGB, T::RGBA32),
            FormatCatalogEntry::new(linear, G::R8G8B8A8_UNorm, T::RGBA32),
            FormatCatalogEntry::new(none, G::R8G8B8A8_SRGB, T::RGBA32),
            // Single and dual channel formats, last resort
            FormatCatalogEntry::new(none, G::R_EAC_UNorm, T::ETC2_EAC_R11),
            FormatCatalogEntry::new(none, G::RG_EAC_UNorm, T::ETC2_EAC_RG11),
        ];

        Self { entries }
    }
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::build_standard()
    }
}
