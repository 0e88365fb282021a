//! Header assembly.
//!
//! Turns image metadata, level extents, page geometry and the resolved mip
//! tail into a complete [`LtxHeader`]. Nothing here touches pixel data.

use zerocopy::byteorder::little_endian::{I64, U32};

use crate::header::LtxHeader;
use crate::mip::{Extent, ImageInfo, MAX_MIP_LEVELS};
use crate::page::PageLayout;
use crate::tail::MipTail;
use crate::{Error, Result};

/// Where one level's data lives in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPlacement {
    pub level: u8,
    pub extent: Extent,
    /// First page of the level. Tail levels share the index of the tail.
    pub first_page: u32,
    /// Pages the level occupies; 0 for tail levels.
    pub page_count: u32,
    pub in_tail: bool,
}

/// Compute the page placement of every level.
pub fn place_levels(
    extents: &[Extent],
    layout: &PageLayout,
    tail: &MipTail,
) -> Result<Vec<LevelPlacement>> {
    if extents.is_empty() {
        return Err(Error::LayoutOverflow("mip chain has no levels".into()));
    }
    if extents.len() > MAX_MIP_LEVELS {
        return Err(Error::LayoutOverflow(format!(
            "{} mip levels exceed the header capacity of {}",
            extents.len(),
            MAX_MIP_LEVELS
        )));
    }
    if tail.start_level() as usize >= extents.len() {
        return Err(Error::LayoutOverflow(format!(
            "mip tail start {} beyond {} levels",
            tail.start_level(),
            extents.len()
        )));
    }

    let mut placements = Vec::with_capacity(extents.len());
    let mut next_page: u32 = 0;

    for (index, extent) in extents.iter().enumerate() {
        let level = index as u8;
        if tail.contains(level) {
            placements.push(LevelPlacement {
                level,
                extent: *extent,
                first_page: next_page,
                page_count: 0,
                in_tail: true,
            });
            continue;
        }

        let page_count = u32::try_from(layout.page_count(*extent))
            .map_err(|_| Error::LayoutOverflow(format!("level {index} page count exceeds u32")))?;
        placements.push(LevelPlacement {
            level,
            extent: *extent,
            first_page: next_page,
            page_count,
            in_tail: false,
        });
        next_page = next_page
            .checked_add(page_count)
            .ok_or_else(|| Error::LayoutOverflow("total page count exceeds u32".into()))?;
    }

    Ok(placements)
}

/// Build the header for a texture.
///
/// Deterministic: identical inputs always give a byte-identical header.
pub fn assemble_header(
    info: &ImageInfo,
    extents: &[Extent],
    layout: &PageLayout,
    tail: &MipTail,
    last_modified: i64,
) -> Result<LtxHeader> {
    let format = info.format();
    if !format.is_known() {
        return Err(Error::UnrecognizedFormat {
            channels: info.channels,
            bytes_per_channel: info.bytes_per_channel,
        });
    }
    if layout.pixel_size() != info.pixel_size() {
        return Err(Error::InvalidConfig(format!(
            "page layout built for {}-byte pixels, image has {}-byte pixels",
            layout.pixel_size(),
            info.pixel_size()
        )));
    }

    let placements = place_levels(extents, layout, tail)?;
    let page_count = placements[tail.start_level() as usize].first_page;

    let tail_offset = (page_count as u64)
        .checked_mul(layout.page_size() as u64)
        .and_then(|bytes| bytes.checked_add(LtxHeader::SIZE as u64))
        .and_then(|offset| u32::try_from(offset).ok())
        .ok_or_else(|| Error::LayoutOverflow("mip tail offset exceeds u32".into()))?;
    let tail_size = u32::try_from(tail.size())
        .map_err(|_| Error::LayoutOverflow(format!("mip tail size {} exceeds u32", tail.size())))?;

    let mut page_index = [U32::new(0); MAX_MIP_LEVELS];
    for placement in &placements {
        page_index[placement.level as usize] = U32::new(placement.first_page);
    }

    let [tile_width, tile_height, tile_depth] = layout.resolution();

    Ok(LtxHeader {
        last_modified: I64::new(last_modified),
        width: U32::new(info.width),
        height: U32::new(info.height),
        page_resolution: [
            U32::new(tile_width),
            U32::new(tile_height),
            U32::new(tile_depth),
        ],
        page_count: U32::new(page_count),
        page_size: U32::new(layout.page_size()),
        mip_level_count: placements.len() as u8,
        mip_tail_start: tail.start_level(),
        mip_tail_offset: U32::new(tail_offset),
        mip_tail_size: U32::new(tail_size),
        mip_level_page_index: page_index,
        format: U32::new(format.code()),
        ..LtxHeader::default()
    })
}
