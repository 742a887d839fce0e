//! KTX Unity Core
//!
//! Core value types for loading KTX2 and Basis Universal textures.
//! This crate provides the building blocks shared by the transcoding layer:
//! image feature masks, texture orientation, container detection and errors.

pub mod container;
pub mod error;
pub mod features;
pub mod orientation;

// Re-export main types
pub use container::ContainerKind;
pub use error::{ErrorCode, KtxError, Result};
pub use features::{ImageFeatures, TextureFeatures, is_multiple_of_four, is_power_of_two};
pub use orientation::TextureOrientation;
