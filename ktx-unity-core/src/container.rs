//! Container detection
//!
//! Only the leading signature is inspected. Parsing the containers themselves is
//! left to the native transcoder.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// KTX 2.0 file identifier: `«KTX 20»\r\n\x1A\n`
pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// KTX 1.x file identifier: `«KTX 11»\r\n\x1A\n`
pub const KTX1_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Basis Universal header signature (`"sB"` as a little-endian u16)
pub const BASIS_SIGNATURE: u16 = 0x4273;

/// Supported texture containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Ktx2,
    Basis,
}

impl ContainerKind {
    /// Detect the container from its leading bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&KTX2_IDENTIFIER) {
            return Some(ContainerKind::Ktx2);
        }
        if data.len() >= 2 && u16::from_le_bytes([data[0], data[1]]) == BASIS_SIGNATURE {
            return Some(ContainerKind::Basis);
        }
        None
    }

    /// True for KTX 1.x files, which are recognised but not loadable
    pub fn is_legacy_ktx(data: &[u8]) -> bool {
        data.starts_with(&KTX1_IDENTIFIER)
    }

    /// Guess the container from a file extension
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ktx2" => Some(ContainerKind::Ktx2),
            "basis" => Some(ContainerKind::Basis),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Ktx2 => "KTX2",
            ContainerKind::Basis => "Basis Universal",
        }
    }
}
