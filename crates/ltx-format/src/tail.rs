//! Mip tail resolution.
//!
//! The tail is the run of levels, starting at the first one that fits in a
//! single page, whose pixels are stored back to back instead of being tiled.

use crate::mip::{Extent, MipLevel};
use crate::page::PageLayout;
use crate::{Error, Result};

/// Start level and byte size of the mip tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipTail {
    start_level: u8,
    size: u64,
}

impl MipTail {
    /// Find the tail of a chain with the given level extents.
    ///
    /// When no level fits in one page (a chain cut short at the level
    /// capacity), the last level alone forms the tail.
    pub fn resolve(extents: &[Extent], layout: &PageLayout) -> Result<Self> {
        let last = extents
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::LayoutOverflow("mip chain has no levels".into()))?;

        let start = extents
            .iter()
            .position(|extent| layout.page_count(*extent) <= 1)
            .unwrap_or(last);
        let start_level = u8::try_from(start)
            .map_err(|_| Error::LayoutOverflow(format!("mip tail start {start} exceeds u8")))?;

        let size = extents[start..]
            .iter()
            .map(|extent| extent.byte_size(layout.pixel_size()))
            .sum();

        Ok(Self { start_level, size })
    }

    pub const fn start_level(&self) -> u8 {
        self.start_level
    }

    /// Total bytes of every tail level.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Check whether `level` is stored in the tail.
    pub const fn contains(&self, level: u8) -> bool {
        level >= self.start_level
    }

    /// Concatenate the pixels of every tail level into one blob.
    pub fn collect_bytes<'a>(&self, levels: impl IntoIterator<Item = &'a MipLevel>) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size as usize);
        for level in levels {
            if self.contains(level.index()) {
                bytes.extend_from_slice(level.pixels());
            }
        }
        bytes
    }
}
