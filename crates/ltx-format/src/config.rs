//! Conversion settings.

use std::path::PathBuf;

use image::imageops::FilterType;

use crate::mip::{DEFAULT_MIN_MIP_DIMENSION, MAX_MIP_LEVELS};
use crate::page::DEFAULT_PAGE_SIZE;
use crate::{Error, Result};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "output.ltx";

/// Filter used to shrink each mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    /// Linear filter; its support widens with the scale factor, which averages
    /// the source area when minifying.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Destination container path.
    pub output: PathBuf,
    /// Bytes per page.
    pub page_size: u32,
    /// Halving stops once both dimensions are at or below this value.
    pub min_mip_dimension: u32,
    /// Level limit, at most [`MAX_MIP_LEVELS`].
    pub max_mip_levels: usize,
    pub filter: ResizeFilter,
    /// Convert 16-bit and float sources to 8 bits per channel.
    pub normalize_to_8bit: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            page_size: DEFAULT_PAGE_SIZE,
            min_mip_dimension: DEFAULT_MIN_MIP_DIMENSION,
            max_mip_levels: MAX_MIP_LEVELS,
            filter: ResizeFilter::default(),
            normalize_to_8bit: false,
        }
    }
}

impl ConvertConfig {
    /// Default settings writing to `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("output path is empty".into()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page size must be non-zero".into()));
        }
        if self.min_mip_dimension == 0 {
            return Err(Error::InvalidConfig(
                "minimum mip dimension must be at least 1".into(),
            ));
        }
        if self.max_mip_levels == 0 || self.max_mip_levels > MAX_MIP_LEVELS {
            return Err(Error::LayoutOverflow(format!(
                "mip level limit {} outside 1..={}",
                self.max_mip_levels, MAX_MIP_LEVELS
            )));
        }
        Ok(())
    }
}
