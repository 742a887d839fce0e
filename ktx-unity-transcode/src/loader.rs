//! Texture loading pipeline
//!
//! Drives one load from encoded bytes to an uploaded GPU texture:
//! open, read metadata, select a format, transcode, create and upload.

use ktx_unity_core::{ContainerKind, TextureOrientation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LoadOptions;
use crate::error::{Result, TranscodeError};
use crate::formats::{GraphicsFormat, TranscodeFormat};
use crate::selector::{FormatPair, FormatSelector};
use crate::transcoder::{Transcoder, TranscoderPool};

/// Parameters for creating a GPU texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub graphics_format: GraphicsFormat,
    pub mip_count: u32,
    pub linear: bool,
}

/// Host rendering runtime
pub trait RenderRuntime {
    type Texture;

    fn is_format_supported(&self, format: GraphicsFormat) -> bool;

    /// Create an empty texture. Only called once a format is committed.
    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<Self::Texture>;

    /// Fill the texture with transcoded bytes, all levels back to back
    fn upload(&mut self, texture: &mut Self::Texture, data: &[u8]) -> Result<()>;
}

/// A loaded texture and how it has to be applied
#[derive(Debug)]
pub struct TextureResult<T> {
    pub texture: T,
    pub orientation: TextureOrientation,
    pub graphics_format: GraphicsFormat,
    pub transcode_format: TranscodeFormat,
}

/// Loads textures with a shared [`FormatSelector`]
#[derive(Debug)]
pub struct TextureLoader<'a> {
    selector: &'a FormatSelector,
    options: LoadOptions,
}

impl<'a> TextureLoader<'a> {
    pub fn new(selector: &'a FormatSelector) -> Self {
        Self::with_options(selector, LoadOptions::default())
    }

    pub fn with_options(selector: &'a FormatSelector, options: LoadOptions) -> Self {
        Self { selector, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a texture from memory
    ///
    /// The transcoder is unloaded before returning, on success and failure.
    pub fn load_bytes<T, R>(
        &self,
        transcoder: &mut T,
        runtime: &mut R,
        data: &[u8],
    ) -> Result<TextureResult<R::Texture>>
    where
        T: Transcoder + ?Sized,
        R: RenderRuntime,
    {
        if ContainerKind::is_legacy_ktx(data) {
            return Err(TranscodeError::UnsupportedVersion("KTX 1.x".to_string()));
        }

        transcoder.open(data)?;
        let result = self.load_opened(transcoder, runtime);
        transcoder.unload();
        result
    }

    /// Load with a transcoder borrowed from a pool
    pub fn load_pooled<T, R>(
        &self,
        pool: &TranscoderPool<T>,
        runtime: &mut R,
        data: &[u8],
    ) -> Result<TextureResult<R::Texture>>
    where
        T: Transcoder,
        R: RenderRuntime,
    {
        let mut transcoder = pool.acquire()?;
        self.load_bytes(&mut *transcoder, runtime, data)
    }

    /// Read a file asynchronously, then load it
    #[cfg(feature = "async")]
    pub async fn load_file_async<T, R, P>(
        &self,
        path: P,
        transcoder: &mut T,
        runtime: &mut R,
    ) -> Result<TextureResult<R::Texture>>
    where
        T: Transcoder + ?Sized,
        R: RenderRuntime,
        P: AsRef<std::path::Path>,
    {
        let data = tokio::fs::read(path.as_ref())
            .await
            .map_err(|e| TranscodeError::open_failed(format!("{}: {}", path.as_ref().display(), e)))?;
        self.load_bytes(transcoder, runtime, &data)
    }

    fn load_opened<T, R>(&self, transcoder: &mut T, runtime: &mut R) -> Result<TextureResult<R::Texture>>
    where
        T: Transcoder + ?Sized,
        R: RenderRuntime,
    {
        let meta = transcoder.load_metadata()?;
        let image = self.options.image_index;

        // Whole-chain transcoders always produce every level of the image
        let whole_chain = transcoder.transcodes_mip_chain();
        let first_level = if whole_chain { 0 } else { self.options.level_index };
        let level = *meta.level(image, first_level)?;
        let features = level.features(meta.has_alpha, self.options.linear);

        let pair: FormatPair = {
            let support = |format: GraphicsFormat| runtime.is_format_supported(format);
            self.selector.select_or_err(features, &support)?
        };

        let last_level = if whole_chain || self.options.mip_chain {
            meta.num_levels(image) as u32
        } else {
            first_level + 1
        };
        let mip_count = last_level - first_level;

        let flags = self.options.transcode_flags;
        let mut bytes = Vec::new();
        if whole_chain {
            transcoder.transcode(image, 0, pair.transcode_format, flags)?;
            bytes.extend_from_slice(output(&*transcoder, pair.transcode_format)?);
        } else {
            for level_index in first_level..last_level {
                transcoder.transcode(image, level_index, pair.transcode_format, flags)?;
                let data = output(&*transcoder, pair.transcode_format)?;
                debug!("Transcoded level {}: {} bytes", level_index, data.len());
                bytes.extend_from_slice(data);
            }
        }

        let descriptor = TextureDescriptor {
            width: level.width,
            height: level.height,
            graphics_format: pair.graphics_format,
            mip_count,
            linear: self.options.linear,
        };
        let mut texture = runtime.create_texture(&descriptor)?;
        runtime.upload(&mut texture, &bytes)?;

        info!(
            "Loaded {}x{} texture as {} ({} levels, {} bytes)",
            level.width, level.height, pair.graphics_format, mip_count, bytes.len()
        );

        Ok(TextureResult {
            texture,
            orientation: transcoder.orientation(),
            graphics_format: pair.graphics_format,
            transcode_format: pair.transcode_format,
        })
    }
}

fn output<T>(transcoder: &T, format: TranscodeFormat) -> Result<&[u8]>
where
    T: Transcoder + ?Sized,
{
    transcoder
        .data()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| TranscodeError::transcode_failed(format, "transcoder produced no data"))
}
