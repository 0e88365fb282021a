//! End-to-end conversion: decode, build the mip chain, lay out pages, write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info, warn};

use crate::config::ConvertConfig;
use crate::header::LtxHeader;
use crate::layout::{assemble_header, place_levels, LevelPlacement};
use crate::mip::{FilterResampler, MipChainBuilder, SourceImage};
use crate::page::PageLayout;
use crate::tail::MipTail;
use crate::writer::{write_atomically, write_container, Section, Sections};
use crate::{Error, Result};

/// Source file extensions accepted by [`load_image`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "exr"];

/// Reject paths whose extension is not an accepted image type.
pub fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(Error::UnsupportedExtension(extension))
    }
}

/// Decode a source image from disk.
pub fn load_image(path: &Path) -> Result<SourceImage> {
    check_extension(path)?;
    let image = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    SourceImage::new(image)
}

/// Modification time of `path` in whole seconds since the Unix epoch.
pub fn last_modified_time(path: &Path) -> Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let seconds = match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
    };
    Ok(seconds)
}

/// A texture laid out and ready to be written.
#[derive(Debug)]
pub struct EncodedTexture {
    header: LtxHeader,
    placements: Vec<LevelPlacement>,
    sections: Sections,
}

impl EncodedTexture {
    pub fn header(&self) -> &LtxHeader {
        &self.header
    }

    /// Placement of every mip level.
    pub fn placements(&self) -> &[LevelPlacement] {
        &self.placements
    }

    /// Number of sections [`EncodedTexture::write_to`] will emit.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Write the container to `sink`, returning the byte count.
    pub fn write_to<W, F>(self, sink: W, on_section: F) -> Result<u64>
    where
        W: Write,
        F: FnMut(&Section),
    {
        write_container(sink, &self.header, self.sections, on_section)
    }
}

/// Lay out a decoded image as an LTX container.
pub fn encode(
    image: SourceImage,
    last_modified: i64,
    config: &ConvertConfig,
) -> Result<EncodedTexture> {
    config.validate()?;

    let image = if config.normalize_to_8bit {
        let before = image.info();
        let image = image.into_8bit();
        if image.info() != before {
            warn!(
                channels = before.channels,
                bytes_per_channel = before.bytes_per_channel,
                "normalized source image to 8 bits per channel"
            );
        }
        image
    } else {
        image
    };

    let info = image.info();
    let pixel_size = info
        .format()
        .pixel_size()
        .ok_or(Error::UnrecognizedFormat {
            channels: info.channels,
            bytes_per_channel: info.bytes_per_channel,
        })?;

    let layout = PageLayout::new(config.page_size, pixel_size)?;
    let chain = MipChainBuilder::new()
        .with_resampler(FilterResampler::new(config.filter.into()))
        .min_dimension(config.min_mip_dimension)
        .max_levels(config.max_mip_levels)
        .build(image)?;

    let extents = chain.extents();
    let tail = MipTail::resolve(&extents, &layout)?;
    let header = assemble_header(&info, &extents, &layout, &tail, last_modified)?;
    let placements = place_levels(&extents, &layout, &tail)?;

    debug!(
        width = info.width,
        height = info.height,
        format = %info.format(),
        levels = extents.len(),
        pages = header.page_count.get(),
        tail_start = tail.start_level(),
        tail_size = tail.size(),
        "laid out texture"
    );

    Ok(EncodedTexture {
        header,
        placements,
        sections: Sections::new(chain, layout, tail),
    })
}

/// Outcome of [`convert_file`].
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub header: LtxHeader,
    pub levels: Vec<LevelPlacement>,
    pub bytes_written: u64,
}

/// Convert the image at `input` into the container at `config.output`.
pub fn convert_file(input: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    config.validate()?;

    let image = load_image(input)?;
    let last_modified = last_modified_time(input)?;
    let encoded = encode(image, last_modified, config)?;

    let header = *encoded.header();
    let levels = encoded.placements().to_vec();
    let bytes_written = write_atomically(&config.output, |sink| encoded.write_to(sink, |_| {}))?;

    info!(
        input = %input.display(),
        output = %config.output.display(),
        bytes = bytes_written,
        "wrote LTX container"
    );

    Ok(ConversionReport {
        output: config.output.clone(),
        header,
        levels,
        bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbaImage};
    use zerocopy::IntoBytes;

    use super::*;
    use crate::writer::temp_path;

    fn gray(width: u32, height: u32) -> SourceImage {
        let buffer = GrayImage::from_fn(width, height, |x, y| Luma([(x ^ y) as u8]));
        SourceImage::new(DynamicImage::ImageLuma8(buffer)).unwrap()
    }

    fn encode_to_vec(image: SourceImage, last_modified: i64, config: &ConvertConfig) -> Vec<u8> {
        let mut out = Vec::new();
        encode(image, last_modified, config)
            .unwrap()
            .write_to(&mut out, |_| {})
            .unwrap();
        out
    }

    #[test]
    fn test_check_extension() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.exr"] {
            check_extension(Path::new(name)).unwrap();
        }
        assert!(matches!(
            check_extension(Path::new("e.bmp")),
            Err(Error::UnsupportedExtension(ext)) if ext == "bmp"
        ));
        assert!(matches!(
            check_extension(Path::new("noext")),
            Err(Error::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_encode_4x4_gray() {
        let config = ConvertConfig::default();
        let encoded = encode(gray(4, 4), 42, &config).unwrap();
        let header = *encoded.header();

        assert_eq!(header.mip_level_count, 2);
        assert_eq!(header.mip_tail_start, 0);
        assert_eq!(header.page_count.get(), 0);
        assert_eq!(header.mip_tail_size.get(), 20);
        assert_eq!(encoded.section_count(), 1);
        assert!(encoded.placements().iter().all(|p| p.in_tail));

        let mut out = Vec::new();
        let written = encoded.write_to(&mut out, |_| {}).unwrap();
        assert_eq!(written, 163);
        assert_eq!(LtxHeader::parse(&out).unwrap(), header);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let config = ConvertConfig::default();
        let a = encode_to_vec(gray(300, 170), 1000, &config);
        let b = encode_to_vec(gray(300, 170), 1000, &config);
        assert_eq!(a, b);

        let c = encode_to_vec(gray(300, 170), 2000, &config);
        assert_eq!(a.len(), c.len());
        let differing: Vec<usize> = (0..a.len()).filter(|&i| a[i] != c[i]).collect();
        assert!(differing.iter().all(|i| (12..20).contains(i)));
    }

    #[test]
    fn test_encode_rejects_16bit_without_normalize() {
        let image = SourceImage::new(DynamicImage::new_rgb16(8, 8)).unwrap();
        let err = encode(image, 0, &ConvertConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnrecognizedFormat {
                channels: 3,
                bytes_per_channel: 2
            }
        ));
    }

    #[test]
    fn test_encode_normalizes_when_asked() {
        let image = SourceImage::new(DynamicImage::new_rgb16(8, 8)).unwrap();
        let config = ConvertConfig {
            normalize_to_8bit: true,
            ..ConvertConfig::default()
        };
        let encoded = encode(image, 0, &config).unwrap();
        assert_eq!(encoded.header().format.get(), 2);
    }

    #[test]
    fn test_encode_with_small_pages() {
        let buffer: RgbaImage = ImageBuffer::from_fn(40, 24, |x, y| {
            image::Rgba([x as u8, y as u8, 7, 255])
        });
        let image = SourceImage::new(DynamicImage::ImageRgba8(buffer)).unwrap();
        let config = ConvertConfig {
            page_size: 256, // 8x8 RGBA tiles
            ..ConvertConfig::default()
        };
        let encoded = encode(image, 0, &config).unwrap();
        let header = *encoded.header();

        // 40x24 -> 5x3 tiles, 20x12 -> 3x2, 10x6 -> 2x1, 5x3 -> tail.
        assert_eq!(header.page_count.get(), 15 + 6 + 2);
        assert_eq!(header.mip_tail_start, 3);
        assert_eq!(header.mip_level_page_index[1].get(), 15);
        assert_eq!(header.mip_level_page_index[2].get(), 21);

        let mut out = Vec::new();
        encoded.write_to(&mut out, |_| {}).unwrap();
        assert_eq!(out.len() as u64, header.file_size());

        // First row of the first page is the first 8 pixels of the base level.
        let first_row = &out[LtxHeader::SIZE..LtxHeader::SIZE + 32];
        for (x, pixel) in first_row.chunks(4).enumerate() {
            assert_eq!(pixel, &[x as u8, 0, 7, 255]);
        }
    }

    #[test]
    fn test_encode_truncated_chain_writes_large_tail() {
        let buffer: RgbaImage = ImageBuffer::from_fn(1024, 1024, |x, y| {
            image::Rgba([(x % 251) as u8, (y % 241) as u8, 0, 255])
        });
        let image = SourceImage::new(DynamicImage::ImageRgba8(buffer)).unwrap();
        let config = ConvertConfig {
            max_mip_levels: 2,
            ..ConvertConfig::default()
        };
        let encoded = encode(image, 0, &config).unwrap();
        let header = *encoded.header();

        // 128x128 tiles: the base takes 64 pages and 512x512 still spans 16,
        // but it is the last level so it becomes the tail.
        assert_eq!(header.mip_level_count, 2);
        assert_eq!(header.mip_tail_start, 1);
        assert_eq!(header.page_count.get(), 64);
        assert_eq!(header.mip_tail_size.get(), 512 * 512 * 4);
        assert_eq!(header.mip_level_page_index[1].get(), 64);
        assert_eq!(encoded.section_count(), 2);

        let mut sections = Vec::new();
        let mut out = Vec::new();
        let written = encoded
            .write_to(&mut out, |section| sections.push((section.level(), section.byte_len())))
            .unwrap();

        assert_eq!(written, header.file_size());
        assert_eq!(out.len() as u64, written);
        assert_eq!(sections, vec![(0, 64 * 65536), (1, 512 * 512 * 4)]);
        assert_eq!(
            header.mip_tail_offset.get() as usize,
            LtxHeader::SIZE + 64 * 65536
        );
    }

    #[test]
    fn test_convert_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.png");
        let buffer = ImageBuffer::from_pixel(512, 300, Rgb([200u8, 100, 50]));
        DynamicImage::ImageRgb8(buffer).save(&input).unwrap();

        let config = ConvertConfig::new(dir.path().join("out.ltx"));
        let report = convert_file(&input, &config).unwrap();

        let bytes = fs::read(&config.output).unwrap();
        assert_eq!(bytes.len() as u64, report.bytes_written);
        assert!(!temp_path(&config.output).exists());

        let header = LtxHeader::parse(&bytes).unwrap();
        assert_eq!(header, report.header);
        assert_eq!(header.width.get(), 512);
        assert_eq!(header.height.get(), 300);
        assert_eq!(header.format.get(), 2);
        assert_eq!(header.page_resolution[0].get(), 147);
        assert_eq!(header.last_modified.get(), last_modified_time(&input).unwrap());
        assert_eq!(report.levels.len(), header.mip_level_count as usize);

        // Same input, same output.
        let again = convert_file(&input, &ConvertConfig::new(dir.path().join("again.ltx"))).unwrap();
        assert_eq!(fs::read(&again.output).unwrap(), bytes);
        assert_eq!(again.header.as_bytes(), header.as_bytes());
    }

    #[test]
    fn test_convert_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::new(dir.path().join("out.ltx"));
        let err = convert_file(&dir.path().join("missing.png"), &config).unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
        assert!(!config.output.exists());
    }
}
