//! KTX Unity
//!
//! Loading of KTX2 and Basis Universal textures with GPU format negotiation.
//!
//! The heavy lifting of block transcoding is done by a native library. This
//! crate decides which GPU format each texture should become, and drives the
//! transcoder and the host runtime through a load.
//!
//! # Examples
//!
//! ```rust
//! use ktx_unity::{FormatSelector, ImageFeatures, RuntimeProfile, TranscodeFormat};
//!
//! let selector = FormatSelector::new();
//! let android = RuntimeProfile::android();
//!
//! // 30x30 is not a multiple of four, so block formats are skipped
//! let features = ImageFeatures::from_dimensions(30, 30, false, false);
//! let pair = selector.select_format(features, &android).unwrap();
//! assert_eq!(pair.transcode_format, TranscodeFormat::RGB565);
//! ```

// Re-export from core and transcode crates
pub use ktx_unity_core::{
    ContainerKind, ErrorCode, ImageFeatures, KtxError, TextureFeatures, TextureOrientation,
    is_multiple_of_four, is_power_of_two,
};

pub use ktx_unity_transcode::{
    FormatCatalog, FormatCatalogEntry, FormatPair, FormatSelector, FormatSupport,
    FormatSupportEntry, GraphicsFormat, GraphicsFormatInfo, ImageInfo, LevelInfo, LoadOptions,
    MetaData, PooledTranscoder, RenderRuntime, Result, RuntimeProfile, SelectionSnapshot,
    SelectionStats, TextureDescriptor, TextureLoader, TextureResult, TranscodeError,
    TranscodeFlags, TranscodeFormat, Transcoder, TranscoderPool,
};

#[cfg(feature = "native")]
pub use ktx_unity_transcode::{BasisTranscoder, KtxTexture};

/// Discovery of texture files on disk
pub mod inventory {
    use crate::{ContainerKind, Result, TranscodeError};
    use std::fs::File;
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use tracing::warn;

    /// A texture file found on disk
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TextureFile {
        pub path: PathBuf,
        pub kind: ContainerKind,
        pub size: u64,
    }

    /// Texture files collected from files and directories
    #[derive(Debug, Default)]
    pub struct TextureInventory {
        files: Vec<TextureFile>,
        skipped: Vec<PathBuf>,
    }

    impl TextureInventory {
        /// Create an empty inventory
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a file or every texture below a directory
        pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
            let path = path.as_ref();

            if path.is_file() {
                self.load_file(path)?;
            } else if path.is_dir() {
                self.traverse_directory(path)?;
            } else {
                return Err(TranscodeError::open_failed(format!(
                    "Path does not exist: {:?}",
                    path
                )));
            }

            Ok(())
        }

        /// Inspect a single file
        ///
        /// The container is detected from the leading bytes. Files that are
        /// neither KTX2 nor Basis are remembered as skipped.
        pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
            let path = path.as_ref();
            let mut header = Vec::with_capacity(12);
            File::open(path)?.take(12).read_to_end(&mut header)?;

            match ContainerKind::detect(&header) {
                Some(kind) => {
                    let size = std::fs::metadata(path)?.len();
                    self.files.push(TextureFile {
                        path: path.to_path_buf(),
                        kind,
                        size,
                    });
                }
                None => {
                    if ContainerKind::from_extension(path).is_some()
                        || ContainerKind::is_legacy_ktx(&header)
                    {
                        warn!("{:?} looks like a texture but is neither KTX2 nor Basis", path);
                    }
                    self.skipped.push(path.to_path_buf());
                }
            }

            Ok(())
        }

        /// Recursively traverse a directory
        fn traverse_directory(&mut self, dir: &Path) -> Result<()> {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .collect();
            entries.sort();

            for path in entries {
                if path.is_dir() {
                    // Skip Unity and VCS directories that don't contain assets
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if matches!(name, "Library" | "Temp" | "Logs" | ".git") {
                        continue;
                    }
                    self.traverse_directory(&path)?;
                } else if path.is_file()
                    && let Err(e) = self.load_file(&path)
                {
                    // Log error but continue with the other files
                    warn!("Failed to inspect {:?}: {}", path, e);
                }
            }

            Ok(())
        }

        /// Detected texture files, in path order
        pub fn files(&self) -> &[TextureFile] {
            &self.files
        }

        /// Files that were not recognised as textures
        pub fn skipped(&self) -> &[PathBuf] {
            &self.skipped
        }

        /// Detected files of one container kind
        pub fn filter_by_kind(&self, kind: ContainerKind) -> Vec<&TextureFile> {
            self.files.iter().filter(|file| file.kind == kind).collect()
        }

        pub fn total_size(&self) -> u64 {
            self.files.iter().map(|file| file.size).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::inventory::TextureInventory;
    use super::*;
    use std::fs;

    const KTX2_HEADER: [u8; 12] = [
        0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
    ];

    #[test]
    fn test_inventory_scans_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut ktx2 = KTX2_HEADER.to_vec();
        ktx2.extend_from_slice(&[0u8; 20]);
        fs::write(dir.path().join("a.ktx2"), &ktx2).unwrap();
        fs::write(dir.path().join("b.basis"), [0x73u8, 0x42, 0x13, 0x00]).unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        fs::create_dir(dir.path().join("Library")).unwrap();
        fs::write(dir.path().join("Library").join("cached.ktx2"), &ktx2).unwrap();

        let mut inventory = TextureInventory::new();
        inventory.load(dir.path()).unwrap();

        assert_eq!(inventory.files().len(), 2);
        assert_eq!(inventory.files()[0].kind, ContainerKind::Ktx2);
        assert_eq!(inventory.files()[0].size, 32);
        assert_eq!(inventory.filter_by_kind(ContainerKind::Basis).len(), 1);
        assert_eq!(inventory.skipped().len(), 1);
        assert_eq!(inventory.total_size(), 36);
    }

    #[test]
    fn test_inventory_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut inventory = TextureInventory::new();
        assert!(inventory.load(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_facade_selection() {
        let selector = FormatSelector::new();
        let features = ImageFeatures::from_dimensions(1024, 1024, false, false);
        let pair = selector
            .select_format(features, &RuntimeProfile::webgl())
            .unwrap();
        assert_eq!(pair.graphics_format, GraphicsFormat::RGBA_DXT1_SRGB);
    }
}
