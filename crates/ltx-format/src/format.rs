//! Pixel format codes stored in the LTX header.

use std::fmt;

/// Pixel layout of the texture payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One 8-bit channel.
    R8,
    /// Two 8-bit channels.
    Rg8,
    /// Three 8-bit channels.
    Rgb8,
    /// Four 8-bit channels.
    Rgba8,
    /// Any channel/depth combination without a code.
    Unknown,
}

impl PixelFormat {
    /// Header code written for [`PixelFormat::Unknown`].
    pub const UNKNOWN_CODE: u32 = 0xFFFF_FFFF;

    /// Classify a channel count and per-channel byte width.
    pub fn classify(channels: u8, bytes_per_channel: u8) -> Self {
        match (channels, bytes_per_channel) {
            (1, 1) => Self::R8,
            (2, 1) => Self::Rg8,
            (3, 1) => Self::Rgb8,
            (4, 1) => Self::Rgba8,
            _ => Self::Unknown,
        }
    }

    /// Numeric code stored in the header.
    pub const fn code(self) -> u32 {
        match self {
            Self::R8 => 0,
            Self::Rg8 => 1,
            Self::Rgb8 => 2,
            Self::Rgba8 => 3,
            Self::Unknown => Self::UNKNOWN_CODE,
        }
    }

    /// Inverse of [`PixelFormat::code`]. Unassigned codes map to `Unknown`.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::R8,
            1 => Self::Rg8,
            2 => Self::Rgb8,
            3 => Self::Rgba8,
            _ => Self::Unknown,
        }
    }

    /// Bytes per pixel, if known.
    pub const fn pixel_size(self) -> Option<u32> {
        match self {
            Self::R8 => Some(1),
            Self::Rg8 => Some(2),
            Self::Rgb8 => Some(3),
            Self::Rgba8 => Some(4),
            Self::Unknown => None,
        }
    }

    /// Check whether this format has a header code.
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::R8 => "R8",
            Self::Rg8 => "RG8",
            Self::Rgb8 => "RGB8",
            Self::Rgba8 => "RGBA8",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_8bit_layouts() {
        assert_eq!(PixelFormat::classify(1, 1).code(), 0);
        assert_eq!(PixelFormat::classify(2, 1).code(), 1);
        assert_eq!(PixelFormat::classify(3, 1).code(), 2);
        assert_eq!(PixelFormat::classify(4, 1).code(), 3);
    }

    #[test]
    fn test_unrecognized_layout_is_not_r8() {
        let format = PixelFormat::classify(3, 2);
        assert_eq!(format, PixelFormat::Unknown);
        assert_eq!(format.code(), PixelFormat::UNKNOWN_CODE);
        assert_ne!(format.code(), 0);

        assert_eq!(PixelFormat::classify(0, 1), PixelFormat::Unknown);
        assert_eq!(PixelFormat::classify(5, 1), PixelFormat::Unknown);
        assert_eq!(PixelFormat::classify(4, 4), PixelFormat::Unknown);
    }

    #[test]
    fn test_unassigned_code_reads_as_unknown() {
        assert_eq!(PixelFormat::from_code(3), PixelFormat::Rgba8);
        assert_eq!(PixelFormat::from_code(42), PixelFormat::Unknown);
    }

    #[test]
    fn test_pixel_size() {
        assert_eq!(PixelFormat::R8.pixel_size(), Some(1));
        assert_eq!(PixelFormat::Rgba8.pixel_size(), Some(4));
        assert_eq!(PixelFormat::classify(3, 2).pixel_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PixelFormat::Rgba8.to_string(), "RGBA8");
        assert_eq!(PixelFormat::Unknown.to_string(), "unknown");
    }
}
