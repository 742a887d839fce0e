//! Bindings to the native Basis Universal / KTX transcoder library
//!
//! Only compiled with the `native` feature. The library is linked as
//! `basisu` and must be provided by the host build.

use ktx_unity_core::TextureOrientation;
use once_cell::sync::Lazy;
use std::os::raw::{c_int, c_void};
use std::ptr;
use tracing::{debug, error};

use crate::error::{Result, TranscodeError};
use crate::formats::{TranscodeFlags, TranscodeFormat};
use crate::transcoder::Transcoder;

const KTX_SUCCESS: c_int = 0;
const KTX_INVALID_OPERATION: c_int = 10;
const KTX_UNKNOWN_FILE_FORMAT: c_int = 15;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RawOrientation {
    x: u32,
    y: u32,
    z: u32,
}

#[link(name = "basisu")]
unsafe extern "C" {
    fn aa_basis_init();
    fn aa_create_basis() -> *mut c_void;
    fn ktx_basisu_open_basis(basis: *mut c_void, data: *const c_void, length: c_int) -> bool;
    fn ktx_basisu_close_basis(basis: *mut c_void);
    fn ktx_basisu_delete_basis(basis: *mut c_void);
    fn ktx_basisu_getHasAlpha(basis: *mut c_void) -> bool;
    fn ktx_basisu_getNumImages(basis: *mut c_void) -> u32;
    fn ktx_basisu_getNumLevels(basis: *mut c_void, image_index: u32) -> u32;
    fn ktx_basisu_getImageWidth(basis: *mut c_void, image_index: u32, level_index: u32) -> u32;
    fn ktx_basisu_getImageHeight(basis: *mut c_void, image_index: u32, level_index: u32) -> u32;
    fn ktx_basisu_getImageTranscodedSizeInBytes(
        basis: *mut c_void,
        image_index: u32,
        level_index: u32,
        format: u32,
    ) -> u32;
    fn ktx_basisu_startTranscoding(basis: *mut c_void) -> bool;
    fn ktx_basisu_transcodeImage(
        basis: *mut c_void,
        dst: *mut c_void,
        dst_size: u32,
        image_index: u32,
        level_index: u32,
        format: u32,
        pvrtc_wrap_addressing: u32,
        get_alpha_for_opaque_formats: u32,
    ) -> bool;

    fn aa_load_ktx(data: *const c_void, length: c_int, status: *mut c_int) -> *mut c_void;
    fn aa_ktx_get_baseWidth(texture: *mut c_void) -> u32;
    fn aa_ktx_get_baseHeight(texture: *mut c_void) -> u32;
    fn aa_ktx_get_numLevels(texture: *mut c_void) -> u32;
    fn aa_ktx_get_numLayers(texture: *mut c_void) -> u32;
    fn aa_ktx_get_numFaces(texture: *mut c_void) -> u32;
    fn aa_ktx_get_orientation(texture: *mut c_void, orientation: *mut RawOrientation);
    fn aa_transcode_ktx(texture: *mut c_void, format: u32, flags: u32) -> c_int;
    fn aa_ktx_get_data(texture: *mut c_void, data: *mut *const u8, length: *mut u32);
    fn aa_unload_ktx(texture: *mut c_void) -> c_int;
}

/// Global transcoder tables, set up once per process
static BASIS_INIT: Lazy<()> = Lazy::new(|| {
    debug!("Initializing Basis Universal transcoder");
    // SAFETY: takes no arguments and is idempotent on the native side
    unsafe { aa_basis_init() }
});

fn buffer_len(data: &[u8]) -> Result<c_int> {
    c_int::try_from(data.len())
        .map_err(|_| TranscodeError::open_failed(format!("Buffer too large: {} bytes", data.len())))
}

/// Transcoder for `.basis` files
///
/// The native handle is created on first [`open`](Transcoder::open) and kept
/// for reuse across loads.
pub struct BasisTranscoder {
    handle: *mut c_void,
    // The native side reads from this buffer until the file is closed
    source: Vec<u8>,
    output: Option<Vec<u8>>,
    opened: bool,
}

// SAFETY: the handle is owned exclusively and never shared between threads
unsafe impl Send for BasisTranscoder {}

impl BasisTranscoder {
    pub fn new() -> Self {
        Self {
            handle: ptr::null_mut(),
            source: Vec::new(),
            output: None,
            opened: false,
        }
    }

    fn ensure_handle(&mut self) -> Result<()> {
        if self.handle.is_null() {
            Lazy::force(&BASIS_INIT);
            // SAFETY: plain constructor call
            self.handle = unsafe { aa_create_basis() };
            if self.handle.is_null() {
                return Err(TranscodeError::open_failed("Failed to create Basis transcoder"));
            }
        }
        Ok(())
    }

    /// Size of one level transcoded to `format`
    pub fn transcoded_size(&self, image: u32, level: u32, format: TranscodeFormat) -> u32 {
        if !self.opened {
            return 0;
        }
        // SAFETY: handle is valid while opened
        unsafe {
            ktx_basisu_getImageTranscodedSizeInBytes(self.handle, image, level, format.as_raw())
        }
    }
}

impl Default for BasisTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder for BasisTranscoder {
    fn open(&mut self, data: &[u8]) -> Result<()> {
        self.unload();
        self.ensure_handle()?;
        self.source = data.to_vec();
        let length = buffer_len(&self.source)?;

        // SAFETY: `source` outlives the opened file, see `unload`
        let opened = unsafe {
            ktx_basisu_open_basis(self.handle, self.source.as_ptr().cast(), length)
        };
        if !opened {
            error!("Couldn't validate BasisU header");
            self.source = Vec::new();
            return Err(TranscodeError::open_failed("Invalid Basis Universal header"));
        }
        self.opened = true;

        // SAFETY: handle holds an opened file
        if !unsafe { ktx_basisu_startTranscoding(self.handle) } {
            self.unload();
            return Err(TranscodeError::loading_failed("Failed to start transcoding"));
        }
        Ok(())
    }

    fn has_alpha(&self) -> bool {
        // SAFETY: handle is valid while opened
        self.opened && unsafe { ktx_basisu_getHasAlpha(self.handle) }
    }

    fn base_width(&self) -> u32 {
        self.level_size(0, 0).map(|(w, _)| w).unwrap_or(0)
    }

    fn base_height(&self) -> u32 {
        self.level_size(0, 0).map(|(_, h)| h).unwrap_or(0)
    }

    fn num_images(&self) -> u32 {
        if !self.opened {
            return 0;
        }
        // SAFETY: handle is valid while opened
        unsafe { ktx_basisu_getNumImages(self.handle) }
    }

    fn num_levels(&self, image: u32) -> u32 {
        if image >= self.num_images() {
            return 0;
        }
        // SAFETY: handle is valid while opened and image is in range
        unsafe { ktx_basisu_getNumLevels(self.handle, image) }
    }

    fn level_size(&self, image: u32, level: u32) -> Option<(u32, u32)> {
        if level >= self.num_levels(image) {
            return None;
        }
        // SAFETY: indices checked above
        unsafe {
            Some((
                ktx_basisu_getImageWidth(self.handle, image, level),
                ktx_basisu_getImageHeight(self.handle, image, level),
            ))
        }
    }

    fn transcode(
        &mut self,
        image: u32,
        level: u32,
        format: TranscodeFormat,
        flags: TranscodeFlags,
    ) -> Result<()> {
        if self.level_size(image, level).is_none() {
            return Err(TranscodeError::InvalidIndex { image, level });
        }

        let size = self.transcoded_size(image, level, format);
        if size == 0 {
            return Err(TranscodeError::transcode_failed(format, "zero output size"));
        }
        let mut buffer = vec![0u8; size as usize];
        let alpha_for_opaque =
            flags.contains(TranscodeFlags::TRANSCODE_ALPHA_DATA_TO_OPAQUE_FORMATS) as u32;

        // SAFETY: `buffer` holds exactly `size` bytes
        let success = unsafe {
            ktx_basisu_transcodeImage(
                self.handle,
                buffer.as_mut_ptr().cast(),
                size,
                image,
                level,
                format.as_raw(),
                0,
                alpha_for_opaque,
            )
        };
        if !success {
            self.output = None;
            return Err(TranscodeError::transcode_failed(
                format,
                format!("image {} level {}", image, level),
            ));
        }
        self.output = Some(buffer);
        Ok(())
    }

    fn data(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    fn unload(&mut self) {
        if self.opened {
            // SAFETY: handle holds an opened file
            unsafe { ktx_basisu_close_basis(self.handle) };
            self.opened = false;
        }
        self.source = Vec::new();
        self.output = None;
    }
}

impl Drop for BasisTranscoder {
    fn drop(&mut self) {
        self.unload();
        if !self.handle.is_null() {
            // SAFETY: handle came from `aa_create_basis` and is dropped once
            unsafe { ktx_basisu_delete_basis(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

/// Transcoder for KTX2 files
///
/// The native side transcodes every level at once.
pub struct KtxTexture {
    handle: *mut c_void,
    transcoded: bool,
}

// SAFETY: the handle is owned exclusively and never shared between threads
unsafe impl Send for KtxTexture {}

impl KtxTexture {
    pub fn new() -> Self {
        Self {
            handle: ptr::null_mut(),
            transcoded: false,
        }
    }

    fn is_loaded(&self) -> bool {
        !self.handle.is_null()
    }
}

impl Default for KtxTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder for KtxTexture {
    fn open(&mut self, data: &[u8]) -> Result<()> {
        self.unload();
        let length = buffer_len(data)?;
        let mut status: c_int = KTX_SUCCESS;

        // SAFETY: libktx copies what it needs from `data` while loading
        let handle = unsafe { aa_load_ktx(data.as_ptr().cast(), length, &mut status) };
        match status {
            KTX_SUCCESS if !handle.is_null() => {
                self.handle = handle;
                Ok(())
            }
            KTX_UNKNOWN_FILE_FORMAT => Err(TranscodeError::UnsupportedVersion(
                "unknown KTX file format".to_string(),
            )),
            other => {
                error!("KTX error code {}", other);
                Err(TranscodeError::open_failed(format!("KTX error code {}", other)))
            }
        }
    }

    // TODO: expose the channel count from the native KTX interface
    fn has_alpha(&self) -> bool {
        false
    }

    fn base_width(&self) -> u32 {
        if !self.is_loaded() {
            return 0;
        }
        // SAFETY: handle is a loaded texture
        unsafe { aa_ktx_get_baseWidth(self.handle) }
    }

    fn base_height(&self) -> u32 {
        if !self.is_loaded() {
            return 0;
        }
        // SAFETY: handle is a loaded texture
        unsafe { aa_ktx_get_baseHeight(self.handle) }
    }

    fn num_images(&self) -> u32 {
        self.num_layers() * self.num_faces()
    }

    fn num_levels(&self, image: u32) -> u32 {
        if image >= self.num_images() {
            return 0;
        }
        // SAFETY: handle is a loaded texture
        unsafe { aa_ktx_get_numLevels(self.handle) }
    }

    fn level_size(&self, image: u32, level: u32) -> Option<(u32, u32)> {
        if level >= self.num_levels(image) {
            return None;
        }
        Some((
            (self.base_width() >> level).max(1),
            (self.base_height() >> level).max(1),
        ))
    }

    fn num_layers(&self) -> u32 {
        if !self.is_loaded() {
            return 0;
        }
        // SAFETY: handle is a loaded texture
        unsafe { aa_ktx_get_numLayers(self.handle) }.max(1)
    }

    fn num_faces(&self) -> u32 {
        if !self.is_loaded() {
            return 0;
        }
        // SAFETY: handle is a loaded texture
        unsafe { aa_ktx_get_numFaces(self.handle) }.max(1)
    }

    fn orientation(&self) -> TextureOrientation {
        if !self.is_loaded() {
            return TextureOrientation::KTX_DEFAULT;
        }
        let mut raw = RawOrientation::default();
        // SAFETY: handle is a loaded texture, `raw` is a valid out pointer
        unsafe { aa_ktx_get_orientation(self.handle, &mut raw) };

        let mut orientation = TextureOrientation::KTX_DEFAULT;
        if raw.x == u32::from(b'l') {
            orientation |= TextureOrientation::X_LEFT;
        }
        if raw.y == u32::from(b'u') {
            orientation |= TextureOrientation::Y_UP;
        }
        if raw.z == u32::from(b'i') {
            orientation |= TextureOrientation::Z_IN;
        }
        orientation
    }

    fn transcodes_mip_chain(&self) -> bool {
        true
    }

    fn transcode(
        &mut self,
        _image: u32,
        _level: u32,
        format: TranscodeFormat,
        flags: TranscodeFlags,
    ) -> Result<()> {
        if !self.is_loaded() {
            return Err(TranscodeError::loading_failed("No KTX texture loaded"));
        }
        // SAFETY: handle is a loaded texture
        let status = unsafe { aa_transcode_ktx(self.handle, format.as_raw(), flags.bits()) };
        match status {
            KTX_SUCCESS => {
                self.transcoded = true;
                Ok(())
            }
            KTX_INVALID_OPERATION => Err(TranscodeError::NotSuperCompressed),
            other => Err(TranscodeError::transcode_failed(
                format,
                format!("KTX error code {}", other),
            )),
        }
    }

    fn data(&self) -> Option<&[u8]> {
        if !self.transcoded {
            return None;
        }
        let mut data: *const u8 = ptr::null();
        let mut length: u32 = 0;
        // SAFETY: handle is a loaded, transcoded texture
        unsafe { aa_ktx_get_data(self.handle, &mut data, &mut length) };
        if data.is_null() {
            return None;
        }
        // SAFETY: libktx owns `length` bytes at `data` until the texture is unloaded
        Some(unsafe { std::slice::from_raw_parts(data, length as usize) })
    }

    fn unload(&mut self) {
        if self.is_loaded() {
            // SAFETY: handle came from `aa_load_ktx` and is released once
            unsafe { aa_unload_ktx(self.handle) };
            self.handle = ptr::null_mut();
        }
        self.transcoded = false;
    }
}

impl Drop for KtxTexture {
    fn drop(&mut self) {
        self.unload();
    }
}
