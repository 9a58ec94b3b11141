use thiserror::Error;

use crate::guid::ComponentId;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("remote failure: {0}")]
    Remote(String),

    // Malformed input
    #[error("invalid magic number {0:#010x}")]
    InvalidMagicNumber(u32),
    #[error("unknown header version {0:#x}")]
    UnknownHeaderVersion(u32),
    #[error("invalid header size {have}, need at least {need}")]
    InvalidHeaderSize { have: u16, need: u16 },
    #[error("model count must be non-zero")]
    InvalidModelCount,
    #[error("image range {offset:#x}+{size:#x} exceeds container size {container:#x}")]
    InvalidImageSize { offset: u64, size: u64, container: u64 },
    #[error("verify range {offset:#x}+{size:#x} exceeds container size {container:#x}")]
    InvalidVerifySize { offset: u64, size: u64, container: u64 },
    #[error("range {offset:#x}+{count:#x} is out of bounds (size {size:#x})")]
    InvalidOffset { offset: u64, count: u64, size: u64 },

    // Lookup failure
    #[error("component index {index} out of range (0..{count})")]
    InvalidComponentIndex { index: usize, count: usize },
    #[error("unknown component {0:#06x}")]
    UnknownComponent(ComponentId),

    // Integrity failure
    #[error("aggregate checksum verification failed")]
    ChecksumVerificationFailed,
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    // Encoder misuse
    #[error("encoding has not begun")]
    EncodingNotBegun,
    #[error("invalid component: {0}")]
    InvalidComponent(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
