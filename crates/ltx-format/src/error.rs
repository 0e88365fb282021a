//! Error types for LTX conversion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or reading LTX containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] ltx_common::Error),

    /// The source image could not be decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The source file extension is not one of the accepted image types.
    #[error("unsupported image extension {0:?}: expected png, jpg, jpeg or exr")]
    UnsupportedExtension(String),

    /// The source image has a zero dimension.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A mip level's pixel buffer does not match its dimensions.
    #[error("mip level {level} size mismatch: expected {expected} bytes, got {actual}")]
    LevelSizeMismatch {
        level: usize,
        expected: u64,
        actual: usize,
    },

    /// A prebuilt level sits at the wrong position in its chain.
    #[error("mip level numbered {index} found at position {position}")]
    LevelOutOfOrder { position: usize, index: u8 },

    /// A level count, page index or byte offset does not fit the header layout.
    #[error("layout overflow: {0}")]
    LayoutOverflow(String),

    /// The pixel layout has no format code.
    #[error("unrecognized pixel format: {channels} channel(s) of {bytes_per_channel} byte(s)")]
    UnrecognizedFormat { channels: u8, bytes_per_channel: u8 },

    /// Invalid conversion settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid LTX magic.
    #[error("invalid LTX magic: got {0:02x?}")]
    InvalidMagic([u8; 12]),

    /// Invalid LTX header.
    #[error("invalid LTX header: {0}")]
    InvalidHeader(String),
}

/// Result type for LTX operations.
pub type Result<T> = std::result::Result<T, Error>;
