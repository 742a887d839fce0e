//! GPU format negotiation
//!
//! [`FormatSelector`] picks the first catalog entry that accepts the image's
//! feature mask and whose GPU format the runtime supports. Results
//! are memoized per mask for the selector's lifetime. Support is assumed to be
//! stable, so the cache is never invalidated.

use ktx_unity_core::{ImageFeatures, TextureFeatures};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

use crate::catalog::{FormatCatalog, FormatCatalogEntry};
use crate::error::{Result, TranscodeError};
use crate::formats::{GraphicsFormat, TranscodeFormat};
use crate::stats::SelectionStats;

/// Answers whether the host runtime can sample a GPU format
pub trait FormatSupport {
    fn is_supported(&self, format: GraphicsFormat) -> bool;
}

impl<F> FormatSupport for F
where
    F: Fn(GraphicsFormat) -> bool,
{
    fn is_supported(&self, format: GraphicsFormat) -> bool {
        self(format)
    }
}

/// The committed (GPU format, transcode format) choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FormatPair {
    pub graphics_format: GraphicsFormat,
    pub transcode_format: TranscodeFormat,
}

impl From<&FormatCatalogEntry> for FormatPair {
    fn from(entry: &FormatCatalogEntry) -> Self {
        Self {
            graphics_format: entry.graphics_format,
            transcode_format: entry.transcode_format,
        }
    }
}

/// One line of the support report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSupportEntry {
    pub entry: FormatCatalogEntry,
    pub supported: bool,
}

/// Format selector with a per-mask cache
#[derive(Debug)]
pub struct FormatSelector {
    catalog: Arc<FormatCatalog>,
    cache: RwLock<HashMap<TextureFeatures, FormatPair>>,
    stats: SelectionStats,
}

impl FormatSelector {
    /// Selector over the standard catalog
    pub fn new() -> Self {
        Self::with_catalog(FormatCatalog::standard())
    }

    pub fn with_catalog(catalog: Arc<FormatCatalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
            stats: SelectionStats::new(),
        }
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> &SelectionStats {
        &self.stats
    }

    /// Select the best supported pair for an image
    ///
    /// When alpha is requested but no alpha-capable format is supported, the
    /// selection is retried once without the alpha requirement. The consumer
    /// then gets an opaque format and has to treat the image as opaque.
    pub fn select_format<S>(&self, features: ImageFeatures, support: &S) -> Option<FormatPair>
    where
        S: FormatSupport + ?Sized,
    {
        let mask = features.mask();
        if let Some(pair) = self.resolve(mask, support) {
            return Some(pair);
        }

        if features.has_alpha {
            let opaque_mask = features.without_alpha().mask();
            if let Some(pair) = self.resolve(opaque_mask, support) {
                warn!(
                    "No alpha-capable format supported for {}, falling back to {}",
                    mask, pair.graphics_format
                );
                self.stats.record_alpha_fallback();
                return Some(self.insert(mask, pair));
            }
        }

        self.stats.record_failure();
        error!("No supported GPU format for features {}", mask);
        None
    }

    /// Same as [`select_format`](Self::select_format), failing with
    /// [`TranscodeError::UnsupportedFormat`]
    pub fn select_or_err<S>(&self, features: ImageFeatures, support: &S) -> Result<FormatPair>
    where
        S: FormatSupport + ?Sized,
    {
        self.select_format(features, support)
            .ok_or_else(|| TranscodeError::unsupported_features(features.mask()))
    }

    /// Report support for every catalog entry
    ///
    /// Diagnostic only. The cache is neither read nor written.
    pub fn support_report<S>(&self, support: &S) -> Vec<FormatSupportEntry>
    where
        S: FormatSupport + ?Sized,
    {
        self.catalog
            .entries()
            .iter()
            .map(|entry| {
                self.stats.record_support_query();
                let supported = support.is_supported(entry.graphics_format);
                debug!(
                    "{} -> {} ({}): {}",
                    entry.requirement,
                    entry.graphics_format,
                    entry.transcode_format,
                    if supported { "supported" } else { "unsupported" }
                );
                FormatSupportEntry {
                    entry: *entry,
                    supported,
                }
            })
            .collect()
    }

    /// Cached pair for a mask, if any
    pub fn cached(&self, mask: TextureFeatures) -> Option<FormatPair> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&mask).copied())
    }

    /// Number of cached masks
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn resolve<S>(&self, mask: TextureFeatures, support: &S) -> Option<FormatPair>
    where
        S: FormatSupport + ?Sized,
    {
        if let Some(pair) = self.cached(mask) {
            self.stats.record_cache_hit();
            debug!("Format cache hit for {}: {}", mask, pair.graphics_format);
            return Some(pair);
        }

        self.stats.record_cache_miss();
        debug!("Format cache miss for {}", mask);

        let pair = self.scan(mask, support)?;
        let pair = self.insert(mask, pair);
        info!(
            "Selected {} / {} for {}",
            pair.graphics_format, pair.transcode_format, mask
        );
        Some(pair)
    }

    fn scan<S>(&self, mask: TextureFeatures, support: &S) -> Option<FormatPair>
    where
        S: FormatSupport + ?Sized,
    {
        self.stats.record_scan();
        self.catalog
            .candidates(mask)
            .filter(|entry| entry.matches(mask))
            .find(|entry| {
                self.stats.record_support_query();
                support.is_supported(entry.graphics_format)
            })
            .map(FormatPair::from)
    }

    /// Store a result, keeping the first one if another thread got there first
    fn insert(&self, mask: TextureFeatures, pair: FormatPair) -> FormatPair {
        match self.cache.write() {
            Ok(mut cache) => *cache.entry(mask).or_insert(pair),
            Err(_) => pair,
        }
    }
}

impl Default for FormatSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(formats: &'static [GraphicsFormat]) -> impl Fn(GraphicsFormat) -> bool {
        move |format| formats.contains(&format)
    }

    #[test]
    fn test_first_supported_entry_wins() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::default();

        let pair = selector.select_format(features, &|_: GraphicsFormat| true).unwrap();
        assert_eq!(pair.graphics_format, GraphicsFormat::RGB_ETC_UNorm);
        assert_eq!(pair.transcode_format, TranscodeFormat::ETC1_RGB);
    }

    #[test]
    fn test_linear_prefers_unorm() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::from_dimensions(256, 256, true, true);
        let support = only(&[
            GraphicsFormat::RGBA_BC7_SRGB,
            GraphicsFormat::RGBA_BC7_UNorm,
        ]);

        let pair = selector.select_format(features, &support).unwrap();
        assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_BC7_UNorm);

        let srgb = ImageFeatures::from_dimensions(256, 256, true, false);
        let pair = selector.select_format(srgb, &support).unwrap();
        assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_BC7_SRGB);
    }

    #[test]
    fn test_unaligned_image_gets_uncompressed() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::from_dimensions(30, 30, false, false);

        let pair = selector.select_format(features, &|_: GraphicsFormat| true).unwrap();
        assert_eq!(pair.transcode_format, TranscodeFormat::RGB565);
    }

    #[test]
    fn test_fallback_is_cached_under_alpha_mask() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::from_dimensions(64, 64, true, false);
        let support = only(&[GraphicsFormat::RGBA_DXT1_SRGB]);

        let pair = selector.select_format(features, &support).unwrap();
        assert_eq!(pair.transcode_format, TranscodeFormat::BC1_RGB);
        assert_eq!(selector.cached(features.mask()), Some(pair));
        assert_eq!(selector.cached(TextureFeatures::NONE), Some(pair));
        assert_eq!(selector.stats().snapshot().alpha_fallbacks, 1);
    }

    #[test]
    fn test_select_or_err() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::from_dimensions(64, 32, false, false);

        let err = selector.select_or_err(features, &|_: GraphicsFormat| false).unwrap_err();
        match err {
            TranscodeError::UnsupportedFormat { features } => {
                assert_eq!(features, TextureFeatures::NON_SQUARE);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(selector.cached_len(), 0);
    }

    #[test]
    fn test_support_report() {
        let selector = FormatSelector::new();
        let report = selector.support_report(&only(&[GraphicsFormat::R8G8B8A8_SRGB]));

        assert_eq!(report.len(), selector.catalog().len());
        assert!(
            report
                .iter()
                .filter(|line| line.supported)
                .all(|line| line.entry.graphics_format == GraphicsFormat::R8G8B8A8_SRGB)
        );
        assert_eq!(selector.cached_len(), 0);
    }
}
