//! LTX header structure.
//!
//! The header is a packed record of 143 bytes. Every multi-byte field is
//! stored little-endian regardless of the host.

use ltx_common::BinaryReader;
use zerocopy::byteorder::little_endian::{I64, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::mip::MAX_MIP_LEVELS;
use crate::page::DEFAULT_PAGE_SIZE;
use crate::{Error, PixelFormat, Result, LTX_MAGIC};

/// LTX file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct LtxHeader {
    /// Format family and version stamp.
    pub magic: [u8; 12],
    /// Modification time of the source image, in seconds since the Unix epoch.
    pub last_modified: I64,
    /// Base level width.
    pub width: U32,
    /// Base level height.
    pub height: U32,
    /// Always 1.
    pub depth: U32,
    /// Page tile width, height and depth.
    pub page_resolution: [U32; 3],
    /// Pages stored before the mip tail.
    pub page_count: U32,
    /// Bytes per page.
    pub page_size: U32,
    /// Always 1.
    pub layer_count: U32,
    /// Number of mip levels.
    pub mip_level_count: u8,
    /// First level stored in the mip tail.
    pub mip_tail_start: u8,
    /// Absolute file offset of the mip tail.
    pub mip_tail_offset: U32,
    /// Bytes of mip tail data.
    pub mip_tail_size: U32,
    /// First page of each level; unused entries are 0.
    pub mip_level_page_index: [U32; MAX_MIP_LEVELS],
    /// Pixel format code.
    pub format: U32,
    /// Reserved.
    pub flags: u8,
    /// Reserved.
    pub color_compression: [u8; 2],
    /// Reserved.
    pub compression_type: u8,
    /// Reserved.
    pub compression_level: u8,
    /// Absolute file offset of the first page.
    pub data_offset: U32,
}

const _: () = assert!(std::mem::size_of::<LtxHeader>() == LtxHeader::SIZE);

impl Default for LtxHeader {
    fn default() -> Self {
        Self {
            magic: LTX_MAGIC,
            last_modified: I64::new(0),
            width: U32::new(0),
            height: U32::new(0),
            depth: U32::new(1),
            page_resolution: [U32::new(0), U32::new(0), U32::new(1)],
            page_count: U32::new(0),
            page_size: U32::new(DEFAULT_PAGE_SIZE),
            layer_count: U32::new(1),
            mip_level_count: 0,
            mip_tail_start: 0,
            mip_tail_offset: U32::new(0),
            mip_tail_size: U32::new(0),
            mip_level_page_index: [U32::new(0); MAX_MIP_LEVELS],
            format: U32::new(0),
            flags: 0,
            color_compression: [0; 2],
            compression_type: 0,
            compression_level: 0,
            data_offset: U32::new(Self::SIZE as u32),
        }
    }
}

impl LtxHeader {
    /// Serialized header size.
    pub const SIZE: usize = 143;

    /// Read a header from the start of a container.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let magic = reader.peek_bytes(LTX_MAGIC.len())?;
        if magic != LTX_MAGIC.as_slice() {
            let mut found = [0u8; 12];
            found.copy_from_slice(magic);
            return Err(Error::InvalidMagic(found));
        }

        let header: Self = reader.read_struct()?;
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if self.data_offset.get() as usize != Self::SIZE {
            return Err(Error::InvalidHeader(format!(
                "data offset {} does not match header size {}",
                self.data_offset.get(),
                Self::SIZE
            )));
        }
        if self.mip_level_count == 0 || self.mip_level_count as usize > MAX_MIP_LEVELS {
            return Err(Error::InvalidHeader(format!(
                "mip level count {} outside 1..={}",
                self.mip_level_count, MAX_MIP_LEVELS
            )));
        }
        if self.mip_tail_start >= self.mip_level_count {
            return Err(Error::InvalidHeader(format!(
                "mip tail start {} beyond level count {}",
                self.mip_tail_start, self.mip_level_count
            )));
        }
        if self.depth.get() != 1 || self.layer_count.get() != 1 {
            return Err(Error::InvalidHeader(
                "only single-layer 2D textures are supported".into(),
            ));
        }
        Ok(())
    }

    /// Version stamp (major, minor, build).
    pub fn version(&self) -> (u8, u8, u8) {
        (self.magic[4], self.magic[5], self.magic[6])
    }

    pub fn pixel_format(&self) -> PixelFormat {
        PixelFormat::from_code(self.format.get())
    }

    /// First page of `level`, or `None` past the last level.
    pub fn page_index(&self, level: usize) -> Option<u32> {
        if level < self.mip_level_count as usize {
            Some(self.mip_level_page_index[level].get())
        } else {
            None
        }
    }

    /// Total container size implied by the header.
    pub fn file_size(&self) -> u64 {
        self.data_offset.get() as u64
            + self.page_count.get() as u64 * self.page_size.get() as u64
            + self.mip_tail_size.get() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LtxHeader {
        LtxHeader {
            width: U32::new(4),
            height: U32::new(4),
            mip_level_count: 2,
            mip_tail_size: U32::new(20),
            mip_tail_offset: U32::new(LtxHeader::SIZE as u32),
            ..LtxHeader::default()
        }
    }

    #[test]
    fn test_default_fields() {
        let header = LtxHeader::default();
        assert_eq!(header.magic, LTX_MAGIC);
        assert_eq!(header.version(), (1, 0, 0));
        assert_eq!(header.depth.get(), 1);
        assert_eq!(header.layer_count.get(), 1);
        assert_eq!(header.page_size.get(), 65536);
        assert_eq!(header.data_offset.get(), 143);
    }

    #[test]
    fn test_field_offsets_little_endian() {
        let mut header = sample();
        header.last_modified = I64::new(0x0102_0304_0506_0708);
        header.page_count = U32::new(0xAABB_CCDD);
        let bytes = header.as_bytes();

        assert_eq!(bytes.len(), LtxHeader::SIZE);
        assert_eq!(&bytes[..12], &LTX_MAGIC);
        assert_eq!(&bytes[12..20], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[20..24], &[4, 0, 0, 0]);
        assert_eq!(&bytes[44..48], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(bytes[56], 2);
        assert_eq!(&bytes[139..143], &[143, 0, 0, 0]);
    }

    #[test]
    fn test_parse_written_header() {
        let header = sample();
        let mut file = header.as_bytes().to_vec();
        file.extend_from_slice(&[0u8; 20]);

        let parsed = LtxHeader::parse(&file).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.page_index(1), Some(0));
        assert_eq!(parsed.page_index(2), None);
        assert_eq!(parsed.file_size(), 143 + 20);
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut bytes = sample().as_bytes().to_vec();
        bytes[1] = b'X';
        assert!(matches!(LtxHeader::parse(&bytes), Err(Error::InvalidMagic(_))));
    }

    #[test]
    fn test_parse_checks_magic_before_size() {
        let mut bytes = sample().as_bytes()[..40].to_vec();
        assert!(matches!(
            LtxHeader::parse(&bytes),
            Err(Error::Common(ltx_common::Error::UnexpectedEof { needed: 143, available: 40 }))
        ));

        bytes[0] = 0;
        match LtxHeader::parse(&bytes) {
            Err(Error::InvalidMagic(found)) => assert_eq!(&found[1..4], b"LTX"),
            other => panic!("expected bad magic, got {other:?}"),
        }
        assert!(matches!(
            LtxHeader::parse(&bytes[..5]),
            Err(Error::Common(ltx_common::Error::UnexpectedEof { needed: 12, available: 5 }))
        ));
    }

    #[test]
    fn test_parse_rejects_truncated() {
        let bytes = sample().as_bytes().to_vec();
        assert!(matches!(
            LtxHeader::parse(&bytes[..100]),
            Err(Error::Common(ltx_common::Error::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_parse_rejects_inconsistent_header() {
        let mut header = sample();
        header.mip_tail_start = 2;
        assert!(matches!(
            LtxHeader::parse(header.as_bytes()),
            Err(Error::InvalidHeader(_))
        ));
    }
}
