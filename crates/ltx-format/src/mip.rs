//! Mip chain construction.
//!
//! A chain starts with the untouched base image and halves both dimensions
//! (rounding down) until each is at or below the configured floor. A dimension
//! that is already at or below the floor is carried over unchanged, so a chain
//! never upsamples and always terminates.

use image::{imageops::FilterType, DynamicImage};
use tracing::{debug, warn};

use crate::{Error, PixelFormat, Result};

/// Capacity of the header's per-level page index table.
pub const MAX_MIP_LEVELS: usize = 16;

/// Default smallest mip dimension.
pub const DEFAULT_MIN_MIP_DIMENSION: u32 = 2;

/// Width and height of an image or mip level, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of a tightly packed pixel buffer with this extent.
    pub const fn byte_size(&self, pixel_size: u32) -> u64 {
        self.width as u64 * self.height as u64 * pixel_size as u64
    }

    /// Check whether neither dimension can be halved any further.
    pub const fn is_at_floor(&self, min_dimension: u32) -> bool {
        self.width <= min_dimension && self.height <= min_dimension
    }

    /// Extent of the next smaller level.
    pub fn halved(&self, min_dimension: u32) -> Self {
        Self {
            width: halve(self.width, min_dimension),
            height: halve(self.height, min_dimension),
        }
    }
}

fn halve(dimension: u32, min_dimension: u32) -> u32 {
    if dimension > min_dimension {
        (dimension / 2).max(min_dimension)
    } else {
        dimension
    }
}

/// Compute the extents of every level of a chain, largest first.
///
/// The result never holds more than `max_levels` entries; a chain cut short
/// ends on a level that is still above the floor.
pub fn plan_mip_extents(base: Extent, min_dimension: u32, max_levels: usize) -> Vec<Extent> {
    let mut extents = vec![base];
    let mut current = base;

    while !current.is_at_floor(min_dimension) && extents.len() < max_levels {
        current = current.halved(min_dimension);
        extents.push(current);
    }

    extents
}

/// Metadata of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub bytes_per_channel: u8,
}

impl ImageInfo {
    /// Bytes per pixel.
    pub const fn pixel_size(&self) -> u32 {
        self.channels as u32 * self.bytes_per_channel as u32
    }

    pub const fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        PixelFormat::classify(self.channels, self.bytes_per_channel)
    }
}

/// A decoded, non-empty source image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
}

impl SourceImage {
    /// Wrap a decoded image, rejecting zero-sized ones.
    pub fn new(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self { image })
    }

    pub fn info(&self) -> ImageInfo {
        let color = self.image.color();
        let channels = color.channel_count();
        ImageInfo {
            width: self.image.width(),
            height: self.image.height(),
            channels,
            bytes_per_channel: color.bytes_per_pixel() / channels.max(1),
        }
    }

    /// Convert 16-bit and floating point images to the 8-bit layout with the
    /// same channel count. 8-bit images are returned untouched.
    pub fn into_8bit(self) -> Self {
        let color = self.image.color();
        if color.bytes_per_pixel() == color.channel_count() {
            return self;
        }

        let image = match color.channel_count() {
            1 => DynamicImage::ImageLuma8(self.image.into_luma8()),
            2 => DynamicImage::ImageLumaA8(self.image.into_luma_alpha8()),
            3 => DynamicImage::ImageRgb8(self.image.into_rgb8()),
            _ => DynamicImage::ImageRgba8(self.image.into_rgba8()),
        };
        Self { image }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

/// Produces a smaller copy of an image.
pub trait Resampler {
    /// Resample `image` to exactly `width` x `height`, keeping its color type.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;
}

/// [`Resampler`] backed by the `image` crate's separable filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterResampler {
    filter: FilterType,
}

impl FilterResampler {
    pub const fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for FilterResampler {
    fn default() -> Self {
        Self::new(FilterType::Triangle)
    }
}

impl Resampler for FilterResampler {
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, self.filter)
    }
}

/// One level of a mip chain with its own pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    index: u8,
    extent: Extent,
    pixels: Vec<u8>,
}

impl MipLevel {
    pub fn new(index: u8, extent: Extent, pixels: Vec<u8>) -> Self {
        Self {
            index,
            extent,
            pixels,
        }
    }

    /// Level index, 0 being the base image.
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Row-major, tightly packed pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// The ordered levels of a texture, largest first.
#[derive(Debug, Clone)]
pub struct MipChain {
    info: ImageInfo,
    levels: Vec<MipLevel>,
}

impl MipChain {
    /// Assemble a chain from prebuilt levels.
    ///
    /// Levels must be numbered 0, 1, 2, ... in order, and every level's buffer
    /// must hold exactly `width * height * pixel_size` bytes.
    pub fn from_levels(info: ImageInfo, levels: Vec<MipLevel>) -> Result<Self> {
        let pixel_size = info.pixel_size();
        for (level, mip) in levels.iter().enumerate() {
            if mip.index() as usize != level {
                return Err(Error::LevelOutOfOrder {
                    position: level,
                    index: mip.index(),
                });
            }
            let expected = mip.extent().byte_size(pixel_size);
            if mip.pixels().len() as u64 != expected {
                return Err(Error::LevelSizeMismatch {
                    level,
                    expected,
                    actual: mip.pixels().len(),
                });
            }
        }
        Ok(Self { info, levels })
    }

    /// Metadata of the base image.
    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn extents(&self) -> Vec<Extent> {
        self.levels.iter().map(MipLevel::extent).collect()
    }

    pub fn into_levels(self) -> Vec<MipLevel> {
        self.levels
    }
}

/// Builds a [`MipChain`] from a base image.
///
/// # Example
///
/// ```
/// use image::{DynamicImage, GrayImage};
/// use ltx_format::{MipChainBuilder, SourceImage};
///
/// let image = SourceImage::new(DynamicImage::ImageLuma8(GrayImage::new(4, 4)))?;
/// let chain = MipChainBuilder::new().build(image)?;
///
/// // 4x4 halves once to the 2x2 floor.
/// assert_eq!(chain.len(), 2);
/// # Ok::<(), ltx_format::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MipChainBuilder<R = FilterResampler> {
    min_dimension: u32,
    max_levels: usize,
    resampler: R,
}

impl MipChainBuilder {
    pub fn new() -> Self {
        Self {
            min_dimension: DEFAULT_MIN_MIP_DIMENSION,
            max_levels: MAX_MIP_LEVELS,
            resampler: FilterResampler::default(),
        }
    }
}

impl Default for MipChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resampler> MipChainBuilder<R> {
    /// Replace the resampler used for every level after the base.
    pub fn with_resampler<S: Resampler>(self, resampler: S) -> MipChainBuilder<S> {
        MipChainBuilder {
            min_dimension: self.min_dimension,
            max_levels: self.max_levels,
            resampler,
        }
    }

    /// Set the dimension at which halving stops.
    pub fn min_dimension(mut self, min_dimension: u32) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    /// Set the maximum number of levels, at most [`MAX_MIP_LEVELS`].
    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Build the chain, consuming the base image.
    pub fn build(&self, image: SourceImage) -> Result<MipChain> {
        if self.min_dimension == 0 {
            return Err(Error::InvalidConfig(
                "minimum mip dimension must be at least 1".into(),
            ));
        }
        if self.max_levels == 0 || self.max_levels > MAX_MIP_LEVELS {
            return Err(Error::LayoutOverflow(format!(
                "mip level limit {} outside 1..={}",
                self.max_levels, MAX_MIP_LEVELS
            )));
        }

        let info = image.info();
        let extents = plan_mip_extents(info.extent(), self.min_dimension, self.max_levels);
        if let Some(last) = extents.last() {
            if !last.is_at_floor(self.min_dimension) {
                warn!(
                    width = info.width,
                    height = info.height,
                    levels = extents.len(),
                    "mip chain truncated at level capacity"
                );
            }
        }

        let mut levels = Vec::with_capacity(extents.len());
        let mut current = image.into_dynamic();

        for (index, extent) in extents.iter().enumerate() {
            if index > 0 {
                current = self.resampler.resize(&current, extent.width, extent.height);
            }
            if current.width() != extent.width || current.height() != extent.height {
                return Err(Error::LevelSizeMismatch {
                    level: index,
                    expected: extent.byte_size(info.pixel_size()),
                    actual: current.as_bytes().len(),
                });
            }

            debug!(
                level = index,
                width = extent.width,
                height = extent.height,
                "built mip level"
            );
            levels.push(MipLevel::new(
                index as u8,
                *extent,
                current.as_bytes().to_vec(),
            ));
        }

        MipChain::from_levels(info, levels)
    }
}
