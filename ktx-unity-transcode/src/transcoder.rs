//! Native transcoder boundary
//!
//! [`Transcoder`] is the narrow interface to the native library that unpacks
//! Basis Universal and KTX2 payloads. Nothing in this crate decodes blocks
//! itself. [`TranscoderPool`] bounds how many transcoders exist at once.

use ktx_unity_core::TextureOrientation;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Result, TranscodeError};
use crate::formats::{TranscodeFlags, TranscodeFormat};
use crate::metadata::{ImageInfo, LevelInfo, MetaData};

/// Operations the native transcoder exposes for one opened texture
pub trait Transcoder {
    /// Open a texture held in memory
    fn open(&mut self, data: &[u8]) -> Result<()>;

    fn has_alpha(&self) -> bool;

    fn base_width(&self) -> u32;

    fn base_height(&self) -> u32;

    /// Number of images (layers, faces or slices)
    fn num_images(&self) -> u32;

    fn num_levels(&self, image: u32) -> u32;

    /// Dimensions of one level, `None` if the indices are out of range
    fn level_size(&self, image: u32, level: u32) -> Option<(u32, u32)>;

    fn num_layers(&self) -> u32 {
        1
    }

    fn num_faces(&self) -> u32 {
        1
    }

    fn orientation(&self) -> TextureOrientation {
        TextureOrientation::KTX_DEFAULT
    }

    /// True if [`transcode`](Self::transcode) converts every level of the
    /// image at once, leaving the full mip chain in [`data`](Self::data)
    fn transcodes_mip_chain(&self) -> bool {
        false
    }

    /// Transcode one level into `format`
    ///
    /// Transcoders that convert whole textures ignore `level`.
    fn transcode(
        &mut self,
        image: u32,
        level: u32,
        format: TranscodeFormat,
        flags: TranscodeFlags,
    ) -> Result<()>;

    /// Output of the last successful [`transcode`](Self::transcode)
    fn data(&self) -> Option<&[u8]>;

    /// Release the opened texture. Safe to call more than once.
    fn unload(&mut self);

    /// Collect per-image level sizes
    fn load_metadata(&self) -> Result<MetaData> {
        let mut images = Vec::with_capacity(self.num_images() as usize);

        for image in 0..self.num_images() {
            let mut levels = Vec::with_capacity(self.num_levels(image) as usize);
            for level in 0..self.num_levels(image) {
                let (width, height) = self
                    .level_size(image, level)
                    .ok_or(TranscodeError::InvalidIndex { image, level })?;
                debug!("Image {} level {}: {}x{}", image, level, width, height);
                levels.push(LevelInfo::new(width, height));
            }
            images.push(ImageInfo { levels });
        }

        Ok(MetaData {
            has_alpha: self.has_alpha(),
            images,
        })
    }
}

struct PoolState<T> {
    idle: Vec<T>,
    created: usize,
}

/// Bounded pool of reusable transcoders
///
/// Instances are created on demand up to the capacity and returned to the
/// pool when their guard is dropped.
pub struct TranscoderPool<T> {
    state: Mutex<PoolState<T>>,
    capacity: usize,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> TranscoderPool<T> {
    /// Create a pool limited to the number of logical CPUs
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_capacity(num_cpus::get(), factory)
    }

    pub fn with_capacity<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                created: 0,
            }),
            capacity: capacity.max(1),
            factory: Box::new(factory),
        }
    }

    /// Take a transcoder, or `None` if all of them are in use
    pub fn try_acquire(&self) -> Option<PooledTranscoder<'_, T>> {
        let mut state = self.state.lock().ok()?;
        let item = match state.idle.pop() {
            Some(item) => item,
            None if state.created < self.capacity => {
                state.created += 1;
                (self.factory)()
            }
            None => return None,
        };
        Some(PooledTranscoder {
            item: ManuallyDrop::new(item),
            pool: self,
        })
    }

    /// Like [`try_acquire`](Self::try_acquire), failing with
    /// [`TranscodeError::NoTranscoderAvailable`]
    pub fn acquire(&self) -> Result<PooledTranscoder<'_, T>> {
        self.try_acquire()
            .ok_or(TranscodeError::NoTranscoderAvailable)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of transcoders currently handed out
    pub fn in_use(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.created - state.idle.len())
            .unwrap_or(0)
    }

    /// Number of created transcoders waiting for reuse
    pub fn idle(&self) -> usize {
        self.state.lock().map(|state| state.idle.len()).unwrap_or(0)
    }

    fn release(&self, item: T) {
        if let Ok(mut state) = self.state.lock() {
            state.idle.push(item);
        }
    }
}

/// A transcoder borrowed from a [`TranscoderPool`]
pub struct PooledTranscoder<'a, T> {
    item: ManuallyDrop<T>,
    pool: &'a TranscoderPool<T>,
}

impl<'a, T> Deref for PooledTranscoder<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.item
    }
}

impl<'a, T> DerefMut for PooledTranscoder<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.item
    }
}

impl<'a, T> Drop for PooledTranscoder<'a, T> {
    fn drop(&mut self) {
        // SAFETY: `item` is not touched again after this point
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.release(item);
    }
}
