//! KTX / Basis Universal transcode driver
//!
//! This crate negotiates which GPU format a compressed texture should be
//! transcoded to, and drives the native transcoder and the host runtime
//! through a load.
//!
//! # Features
//!
//! - **Format negotiation**: ordered [`FormatCatalog`] plus a caching [`FormatSelector`]
//! - **Alpha fallback**: opaque formats when no alpha-capable format is supported
//! - **Runtime profiles**: YAML-described GPU support for offline planning
//! - **Loading pipeline**: [`TextureLoader`] over the [`Transcoder`] and [`RenderRuntime`] traits
//!
//! ## Feature Flags
//!
//! - `native`: bindings to the native transcoder library (`BasisTranscoder`, `KtxTexture`)
//! - `async`: asynchronous file loading with tokio
//!
//! # Example
//!
//! ```rust
//! use ktx_unity_core::ImageFeatures;
//! use ktx_unity_transcode::{FormatSelector, GraphicsFormat, RuntimeProfile};
//!
//! let selector = FormatSelector::new();
//! let profile = RuntimeProfile::desktop();
//!
//! let features = ImageFeatures::from_dimensions(512, 512, true, false);
//! let pair = selector.select_format(features, &profile).unwrap();
//! assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_BC7_SRGB);
//! ```

// Core modules (always available)
pub mod catalog;
pub mod config;
pub mod error;
pub mod formats;
pub mod loader;
pub mod metadata;
pub mod selector;
pub mod stats;
pub mod transcoder;

// Feature-gated modules
#[cfg(feature = "native")]
pub mod native;

// Re-export core types (always available)
pub use catalog::{FormatCatalog, FormatCatalogEntry};
pub use config::{LoadOptions, RuntimeProfile};
pub use error::{Result, TranscodeError};
pub use formats::{GraphicsFormat, GraphicsFormatInfo, TranscodeFlags, TranscodeFormat};
pub use loader::{RenderRuntime, TextureDescriptor, TextureLoader, TextureResult};
pub use metadata::{ImageInfo, LevelInfo, MetaData};
pub use selector::{FormatPair, FormatSelector, FormatSupport, FormatSupportEntry};
pub use stats::{SelectionSnapshot, SelectionStats};
pub use transcoder::{PooledTranscoder, Transcoder, TranscoderPool};

#[cfg(feature = "native")]
pub use native::{BasisTranscoder, KtxTexture};
