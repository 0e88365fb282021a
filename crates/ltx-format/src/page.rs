//! Rectangular page tiling.
//!
//! Each page holds one square tile of a mip level. Tiles are laid out with a
//! fixed row stride of `tile_size * pixel_size` bytes; tiles on the right and
//! bottom edges keep their pixels in the top-left corner and leave the rest
//! of the page zeroed.

use std::fmt;

use crate::mip::{Extent, MipLevel};
use crate::{Error, Result};

/// Default page size in bytes.
pub const DEFAULT_PAGE_SIZE: u32 = 65536;

/// Pixel rectangle covered by one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Page geometry for one pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: u32,
    pixel_size: u32,
    tile_size: u32,
}

impl PageLayout {
    /// Derive the tile size: the largest square of pixels that fits a page.
    pub fn new(page_size: u32, pixel_size: u32) -> Result<Self> {
        if pixel_size == 0 {
            return Err(Error::InvalidConfig("pixel size must be non-zero".into()));
        }

        let tile_size = (page_size / pixel_size).isqrt();
        if tile_size == 0 {
            return Err(Error::LayoutOverflow(format!(
                "page size {page_size} cannot hold a {pixel_size}-byte pixel"
            )));
        }

        Ok(Self {
            page_size,
            pixel_size,
            tile_size,
        })
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub const fn tile_width(&self) -> u32 {
        self.tile_size
    }

    pub const fn tile_height(&self) -> u32 {
        self.tile_size
    }

    /// Page tile resolution as stored in the header (width, height, depth).
    pub const fn resolution(&self) -> [u32; 3] {
        [self.tile_size, self.tile_size, 1]
    }

    /// Bytes between the starts of two tile rows inside a page.
    pub const fn row_stride(&self) -> usize {
        self.tile_size as usize * self.pixel_size as usize
    }

    /// Number of tile columns and rows covering `extent`.
    pub fn tile_grid(&self, extent: Extent) -> (u32, u32) {
        (
            extent.width.div_ceil(self.tile_size),
            extent.height.div_ceil(self.tile_size),
        )
    }

    /// Pages needed to tile a level of this extent.
    pub fn page_count(&self, extent: Extent) -> u64 {
        let (columns, rows) = self.tile_grid(extent);
        columns as u64 * rows as u64
    }

    /// Rectangle of the `page`-th tile in row-major order, clipped to the level.
    pub fn tile_rect(&self, extent: Extent, page: u64) -> Option<TileRect> {
        let (columns, rows) = self.tile_grid(extent);
        if columns == 0 || page >= columns as u64 * rows as u64 {
            return None;
        }

        let column = (page % columns as u64) as u32;
        let row = (page / columns as u64) as u32;
        let x = column * self.tile_size;
        let y = row * self.tile_size;

        Some(TileRect {
            x,
            y,
            width: self.tile_size.min(extent.width - x),
            height: self.tile_size.min(extent.height - y),
        })
    }
}

/// One zero-padded page of tile data.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    tile: TileRect,
    bytes: Box<[u8]>,
}

impl Page {
    /// Pixel rectangle stored in this page.
    pub fn tile(&self) -> TileRect {
        self.tile
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("tile", &self.tile)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Iterator over the pages of one mip level, row by row, left to right.
#[derive(Debug)]
pub struct Paginator<'a> {
    level: &'a MipLevel,
    layout: PageLayout,
    next: u64,
    count: u64,
}

impl<'a> Paginator<'a> {
    pub fn new(level: &'a MipLevel, layout: PageLayout) -> Self {
        Self {
            level,
            layout,
            next: 0,
            count: layout.page_count(level.extent()),
        }
    }

    fn fill(&self, tile: TileRect) -> Page {
        let pixel_size = self.layout.pixel_size as usize;
        let src_stride = self.level.width() as usize * pixel_size;
        let dst_stride = self.layout.row_stride();
        let span = tile.width as usize * pixel_size;
        let pixels = self.level.pixels();

        let mut bytes = vec![0u8; self.layout.page_size as usize].into_boxed_slice();
        for row in 0..tile.height as usize {
            let src = (tile.y as usize + row) * src_stride + tile.x as usize * pixel_size;
            let dst = row * dst_stride;
            bytes[dst..dst + span].copy_from_slice(&pixels[src..src + span]);
        }

        Page { tile, bytes }
    }
}

impl Iterator for Paginator<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        if self.next >= self.count {
            return None;
        }
        let tile = self.layout.tile_rect(self.level.extent(), self.next)?;
        self.next += 1;
        Some(self.fill(tile))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Paginator<'_> {}

/// Split a level into its pages.
pub fn paginate(level: &MipLevel, layout: PageLayout) -> Vec<Page> {
    Paginator::new(level, layout).collect()
}
