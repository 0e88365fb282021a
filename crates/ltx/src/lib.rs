//! Ltx - image to paged texture container conversion.
//!
//! # Crates
//!
//! - [`ltx_common`] - Common utilities (little-endian binary reading, errors)
//! - [`ltx_format`] - LTX header, mip chain, paging and container writing
//!
//! # Example
//!
//! ```no_run
//! use ltx::prelude::*;
//!
//! let data = std::fs::read("texture.ltx")?;
//! let header = LtxHeader::parse(&data)?;
//! println!("{}x{} {}", header.width.get(), header.height.get(), header.pixel_format());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use ltx_common as common;
pub use ltx_format as format;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ltx_common::BinaryReader;
    pub use ltx_format::{
        convert_file, encode, last_modified_time, load_image, write_atomically, ConvertConfig,
        LtxHeader, PixelFormat, ResizeFilter, Section, SourceImage,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
