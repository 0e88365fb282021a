//! LTX paged texture containers.
//!
//! An LTX file stores a 2D image and its mip chain for virtual texturing:
//! - a fixed 143-byte header
//! - square pages holding the tiles of every large level, largest first
//! - the mip tail, a raw blob with every level small enough to fit in a page
//!
//! # Example
//!
//! ```no_run
//! use ltx_format::{convert_file, ConvertConfig};
//!
//! let config = ConvertConfig::new("texture.ltx");
//! let report = convert_file("texture.png".as_ref(), &config)?;
//! println!("{} levels, {} bytes", report.levels.len(), report.bytes_written);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod convert;
mod error;
mod format;
mod header;
mod layout;
mod mip;
mod page;
mod tail;
mod writer;

pub use config::{ConvertConfig, ResizeFilter, DEFAULT_OUTPUT};
pub use convert::{
    check_extension, convert_file, encode, last_modified_time, load_image, ConversionReport,
    EncodedTexture, SUPPORTED_EXTENSIONS,
};
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use header::LtxHeader;
pub use layout::{assemble_header, place_levels, LevelPlacement};
pub use mip::{
    plan_mip_extents, Extent, FilterResampler, ImageInfo, MipChain, MipChainBuilder, MipLevel,
    Resampler, SourceImage, DEFAULT_MIN_MIP_DIMENSION, MAX_MIP_LEVELS,
};
pub use page::{paginate, Page, PageLayout, Paginator, TileRect, DEFAULT_PAGE_SIZE};
pub use tail::MipTail;
pub use writer::{temp_path, write_atomically, write_container, ContainerWriter, Section, Sections};

/// LTX magic: format family, version 1.0.0, then line-ending sentinels.
pub const LTX_MAGIC: [u8; 12] = [
    0xAB, b'L', b'T', b'X', 1, 0, 0, 0xBB, b'\r', b'\n', 0x1A, b'\n',
];
