//! Format Selection Tests
//!
//! This file tests GPU format negotiation: priority order, the alpha fallback,
//! exhaustive failure and the per-mask cache.

use ktx_unity_core::{ImageFeatures, TextureFeatures};
use ktx_unity_transcode::{
    FormatCatalog, FormatCatalogEntry, FormatPair, FormatSelector, GraphicsFormat,
    RuntimeProfile, TranscodeFormat,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

/// Support predicate accepting only the listed formats
fn supports(formats: &[GraphicsFormat]) -> impl Fn(GraphicsFormat) -> bool + use<> {
    let formats = formats.to_vec();
    move |format| formats.contains(&format)
}

fn nothing(_: GraphicsFormat) -> bool {
    false
}

fn everything(_: GraphicsFormat) -> bool {
    true
}

/// Every combination of the five feature flags
fn all_feature_combinations() -> Vec<ImageFeatures> {
    (0u8..32)
        .map(|bits| ImageFeatures {
            has_alpha: bits & 1 != 0,
            is_power_of_two: bits & 2 != 0,
            is_multiple_of_four: bits & 4 != 0,
            is_square: bits & 8 != 0,
            is_linear: bits & 16 != 0,
        })
        .collect()
}

/// Regular opaque image with only BC1 supported
#[test]
fn test_bc1_only_opaque() {
    let selector = FormatSelector::new();
    let support = supports(&[GraphicsFormat::RGBA_DXT1_SRGB, GraphicsFormat::RGBA_DXT1_UNorm]);

    let pair = selector
        .select_format(ImageFeatures::default(), &support)
        .unwrap();
    assert_eq!(
        pair,
        FormatPair {
            graphics_format: GraphicsFormat::RGBA_DXT1_SRGB,
            transcode_format: TranscodeFormat::BC1_RGB,
        }
    );
}

/// Alpha image with only BC1 supported falls back to the opaque result
#[test]
fn test_bc1_only_alpha_falls_back() {
    let selector = FormatSelector::new();
    let support = supports(&[GraphicsFormat::RGBA_DXT1_SRGB, GraphicsFormat::RGBA_DXT1_UNorm]);
    let features = ImageFeatures {
        has_alpha: true,
        ..ImageFeatures::default()
    };

    let pair = selector.select_format(features, &support).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_DXT1_SRGB);
    assert_eq!(pair.transcode_format, TranscodeFormat::BC1_RGB);

    let stats = selector.stats().snapshot();
    assert_eq!(stats.alpha_fallbacks, 1);
    assert_eq!(stats.failures, 0);
    // One scan for the alpha mask, one for the opaque retry
    assert_eq!(stats.catalog_scans, 2);
}

/// The fallback result equals a direct opaque selection
#[test]
fn test_alpha_fallback_matches_opaque_selection() {
    let support = supports(&[GraphicsFormat::RGB_ETC_UNorm, GraphicsFormat::RGB_ETC2_SRGB]);

    for features in all_feature_combinations()
        .into_iter()
        .filter(|f| f.has_alpha)
    {
        let with_alpha = FormatSelector::new().select_format(features, &support);
        let opaque = FormatSelector::new().select_format(features.without_alpha(), &support);
        assert_eq!(with_alpha, opaque, "{:?}", features);
    }
}

/// PVRTC is never chosen for a non-square, non-power-of-two image
#[test]
fn test_pvrtc_only_rejects_irregular_image() {
    let selector = FormatSelector::new();
    let support = supports(&[
        GraphicsFormat::RGB_PVRTC_4Bpp_SRGB,
        GraphicsFormat::RGB_PVRTC_4Bpp_UNorm,
    ]);

    // 12x8: non-power-of-two and non-square, but a multiple of four
    let features = ImageFeatures::from_dimensions(12, 8, false, false);
    assert_eq!(
        features.mask(),
        TextureFeatures::NON_POWER_OF_TWO | TextureFeatures::NON_SQUARE
    );
    assert_eq!(selector.select_format(features, &support), None);
    assert!(selector.select_or_err(features, &support).is_err());

    // Either irregularity alone is enough to rule it out
    let wide = ImageFeatures::from_dimensions(256, 128, false, false);
    assert_eq!(selector.select_format(wide, &support), None);
    let npot = ImageFeatures::from_dimensions(96, 96, false, false);
    assert_eq!(selector.select_format(npot, &support), None);
    assert_eq!(selector.cached_len(), 0);

    let regular = ImageFeatures::from_dimensions(256, 256, false, false);
    let pair = selector.select_format(regular, &support).unwrap();
    assert_eq!(pair.transcode_format, TranscodeFormat::PVRTC1_4_RGB);

    // Alpha PVRTC follows the same rule, and the opaque retry finds nothing
    let alpha_support = supports(&[GraphicsFormat::RGBA_PVRTC_4Bpp_SRGB]);
    let alpha = ImageFeatures::from_dimensions(12, 8, true, false);
    assert_eq!(selector.select_format(alpha, &alpha_support), None);
}

/// A requirement the image does not meet is never selected
#[test]
fn test_unmet_requirement_is_not_selected() {
    let catalog = FormatCatalog::from_entries(vec![FormatCatalogEntry::new(
        TextureFeatures::NON_MULTIPLE_OF_FOUR,
        GraphicsFormat::RGB_PVRTC_4Bpp_SRGB,
        TranscodeFormat::PVRTC1_4_RGB,
    )]);
    let selector = FormatSelector::with_catalog(Arc::new(catalog));

    let features = ImageFeatures::from_dimensions(12, 8, false, false);
    let support = supports(&[GraphicsFormat::RGB_PVRTC_4Bpp_SRGB]);
    assert_eq!(selector.select_format(features, &support), None);
    assert_eq!(selector.cached_len(), 0);

    // The same entry is fine once its requirement holds
    let unaligned = ImageFeatures::from_dimensions(30, 30, false, false);
    let pair = selector.select_format(unaligned, &support).unwrap();
    assert_eq!(pair.transcode_format, TranscodeFormat::PVRTC1_4_RGB);
}

/// Irregular images on PVRTC devices end up uncompressed
#[test]
fn test_pvrtc_device_irregular_image() {
    let selector = FormatSelector::new();
    let profile = RuntimeProfile::ios();

    let npot = ImageFeatures::from_dimensions(12, 8, false, false);
    let pair = selector.select_format(npot, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::R5G6B5_UNormPack16);

    let npot_alpha = ImageFeatures::from_dimensions(12, 8, true, false);
    let pair = selector.select_format(npot_alpha, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_ASTC4X4_SRGB);

    let regular = ImageFeatures::from_dimensions(256, 256, false, false);
    let pair = selector.select_format(regular, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::RGB_PVRTC_4Bpp_SRGB);

    let regular_alpha = ImageFeatures::from_dimensions(256, 256, true, false);
    let pair = selector.select_format(regular_alpha, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_ASTC4X4_SRGB);
}

/// Unaligned images skip block formats on desktop, which only has BGR565
#[test]
fn test_desktop_unaligned_image() {
    let selector = FormatSelector::new();
    let profile = RuntimeProfile::desktop();

    let unaligned = ImageFeatures::from_dimensions(30, 30, false, false);
    let pair = selector.select_format(unaligned, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::B5G6R5_UNormPack16);
    assert_eq!(pair.transcode_format, TranscodeFormat::BGR565);

    let aligned = ImageFeatures::from_dimensions(32, 32, false, false);
    let pair = selector.select_format(aligned, &profile).unwrap();
    assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_DXT1_SRGB);
}

/// Nothing supported means failure for every feature combination
#[test]
fn test_nothing_supported_fails() {
    let selector = FormatSelector::new();

    for features in all_feature_combinations() {
        assert_eq!(selector.select_format(features, &nothing), None, "{:?}", features);
    }
    assert_eq!(selector.cached_len(), 0);
    assert_eq!(selector.stats().snapshot().failures, 32);
}

/// Everything supported never fails
#[test]
fn test_standard_catalog_always_resolves() {
    let selector = FormatSelector::new();
    for features in all_feature_combinations() {
        let pair = selector.select_format(features, &everything).unwrap();
        assert_eq!(
            pair.graphics_format.info().has_alpha,
            features.has_alpha,
            "{:?}",
            features
        );
    }
    assert_eq!(selector.stats().snapshot().alpha_fallbacks, 0);
}

/// Second identical request is answered from the cache
#[test]
fn test_second_call_hits_cache() {
    let selector = FormatSelector::new();
    let support = supports(&[GraphicsFormat::RGBA_ASTC4X4_SRGB]);
    let features = ImageFeatures::from_dimensions(128, 128, true, false);

    let first = selector.select_format(features, &support).unwrap();
    let after_first = selector.stats().snapshot();
    assert_eq!(after_first.catalog_scans, 1);
    assert_eq!(after_first.cache_misses, 1);

    let second = selector.select_format(features, &support).unwrap();
    let after_second = selector.stats().snapshot();

    assert_eq!(first, second);
    assert_eq!(after_second.catalog_scans, after_first.catalog_scans);
    assert_eq!(after_second.support_queries, after_first.support_queries);
    assert_eq!(after_second.cache_hits, 1);
}

/// A cached alpha fallback is not rescanned either
#[test]
fn test_cached_fallback_is_not_rescanned() {
    let selector = FormatSelector::new();
    let support = supports(&[GraphicsFormat::RGB_ETC_UNorm]);
    let features = ImageFeatures::from_dimensions(64, 64, true, false);

    let first = selector.select_format(features, &support).unwrap();
    let scans = selector.stats().snapshot().catalog_scans;

    let second = selector.select_format(features, &support).unwrap();
    assert_eq!(first, second);
    assert_eq!(selector.stats().snapshot().catalog_scans, scans);
    assert_eq!(selector.stats().snapshot().alpha_fallbacks, 1);
}

/// Earlier catalog entries win over later ones
#[test]
fn test_priority_order() {
    let catalog = FormatCatalog::standard();

    for features in all_feature_combinations() {
        let mask = features.mask();
        let expected = catalog
            .candidates(mask)
            .find(|entry| entry.matches(mask))
            .map(FormatPair::from);
        let actual = FormatSelector::new().select_format(features, &everything);
        assert_eq!(actual, expected, "{:?}", features);
    }

    // BC7 and BC3 both qualify, BC7 is listed first
    let selector = FormatSelector::new();
    let support = supports(&[GraphicsFormat::RGBA_DXT5_SRGB, GraphicsFormat::RGBA_BC7_SRGB]);
    let features = ImageFeatures::from_dimensions(256, 256, true, false);
    let pair = selector.select_format(features, &support).unwrap();
    assert_eq!(pair.transcode_format, TranscodeFormat::BC7_RGBA);
}

/// Images with the same mask get the same pair whatever their size
#[test]
fn test_same_mask_same_result() {
    let selector = FormatSelector::new();
    let profile = RuntimeProfile::android();

    let a = ImageFeatures::from_dimensions(30, 20, true, false);
    let b = ImageFeatures::from_dimensions(50, 10, true, false);
    assert_eq!(a.mask(), b.mask());

    let first = selector.select_format(a, &profile).unwrap();
    let second = selector.select_format(b, &profile).unwrap();
    assert_eq!(first, second);
    assert_eq!(selector.stats().snapshot().cache_hits, 1);
}

/// Concurrent selections agree and share one cache entry
#[test]
fn test_concurrent_selection() {
    let selector = Arc::new(FormatSelector::new());
    let features = ImageFeatures::from_dimensions(512, 256, true, true);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let selector = Arc::clone(&selector);
            thread::spawn(move || {
                let profile = RuntimeProfile::desktop();
                selector.select_format(features, &profile)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(results.iter().all(|r| *r == results[0]));
    assert_eq!(
        results[0].map(|pair| pair.graphics_format),
        Some(GraphicsFormat::RGBA_BC7_UNorm)
    );
    assert_eq!(selector.cached_len(), 1);
}

/// Diagnostic report covers the whole catalog without touching the cache
#[test]
fn test_support_report_for_profile() {
    let selector = FormatSelector::new();
    let profile = RuntimeProfile::webgl();

    let report = selector.support_report(&profile);
    assert_eq!(report.len(), selector.catalog().len());
    for line in &report {
        assert_eq!(line.supported, profile.supports(line.entry.graphics_format));
    }
    assert_eq!(selector.cached_len(), 0);
}

fn support_from_bits(bits: u32) -> Vec<GraphicsFormat> {
    GraphicsFormat::ALL
        .iter()
        .enumerate()
        .filter(|(i, _)| bits & (1 << i) != 0)
        .map(|(_, format)| *format)
        .collect()
}

proptest! {
    /// Property: repeated selection is deterministic and never rescans
    #[test]
    fn prop_selection_is_deterministic(
        width in 1u32..4096,
        height in 1u32..4096,
        has_alpha in any::<bool>(),
        linear in any::<bool>(),
        support_bits in any::<u32>(),
    ) {
        let features = ImageFeatures::from_dimensions(width, height, has_alpha, linear);
        let support = supports(&support_from_bits(support_bits));

        let selector = FormatSelector::new();
        let first = selector.select_format(features, &support);
        let scans = selector.stats().snapshot().catalog_scans;
        let second = selector.select_format(features, &support);

        prop_assert_eq!(first, second);
        prop_assert_eq!(FormatSelector::new().select_format(features, &support), first);
        if first.is_some() {
            prop_assert_eq!(selector.stats().snapshot().catalog_scans, scans);
        }
    }

    /// Property: a selected format is always one the runtime supports
    #[test]
    fn prop_selected_format_is_supported(
        width in 1u32..4096,
        height in 1u32..4096,
        has_alpha in any::<bool>(),
        support_bits in any::<u32>(),
    ) {
        let formats = support_from_bits(support_bits);
        let features = ImageFeatures::from_dimensions(width, height, has_alpha, false);

        if let Some(pair) = FormatSelector::new().select_format(features, &supports(&formats)) {
            prop_assert!(formats.contains(&pair.graphics_format));
        }
    }
}
