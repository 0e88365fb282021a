//! Container serialization.
//!
//! A container is the header followed by the pages of every level before the
//! tail (largest level first, tiles row-major), then the tail blob.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zerocopy::IntoBytes;

use crate::header::LtxHeader;
use crate::mip::{MipChain, MipLevel};
use crate::page::{paginate, Page, PageLayout};
use crate::tail::MipTail;
use crate::{Error, Result};

/// A run of container bytes produced from the mip chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// The tiled pages of one level.
    Pages { level: u8, pages: Vec<Page> },
    /// Every tail level, concatenated.
    Tail { start_level: u8, bytes: Vec<u8> },
}

impl Section {
    /// Bytes this section occupies in the file.
    pub fn byte_len(&self) -> u64 {
        match self {
            Self::Pages { pages, .. } => pages.iter().map(|p| p.len() as u64).sum(),
            Self::Tail { bytes, .. } => bytes.len() as u64,
        }
    }

    /// First level covered by this section.
    pub fn level(&self) -> u8 {
        match self {
            Self::Pages { level, .. } => *level,
            Self::Tail { start_level, .. } => *start_level,
        }
    }
}

/// Splits a mip chain into sections in file order.
///
/// Levels are consumed as the iterator advances, so each level's pixels are
/// released once its pages are produced.
#[derive(Debug)]
pub struct Sections {
    levels: std::vec::IntoIter<MipLevel>,
    layout: PageLayout,
    tail: MipTail,
}

impl Sections {
    pub fn new(chain: MipChain, layout: PageLayout, tail: MipTail) -> Self {
        Self {
            levels: chain.into_levels().into_iter(),
            layout,
            tail,
        }
    }
}

impl Iterator for Sections {
    type Item = Section;

    fn next(&mut self) -> Option<Section> {
        let level = self.levels.next()?;

        if !self.tail.contains(level.index()) {
            let pages = paginate(&level, self.layout);
            return Some(Section::Pages {
                level: level.index(),
                pages,
            });
        }

        let start_level = level.index();
        let mut bytes = Vec::with_capacity(self.tail.size() as usize);
        bytes.extend_from_slice(level.pixels());
        drop(level);
        let rest: Vec<MipLevel> = self.levels.by_ref().collect();
        bytes.extend_from_slice(&self.tail.collect_bytes(&rest));

        Some(Section::Tail { start_level, bytes })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.levels.as_slice();
        let paged = remaining
            .iter()
            .filter(|level| !self.tail.contains(level.index()))
            .count();
        let tail = usize::from(paged < remaining.len());
        (paged + tail, Some(paged + tail))
    }
}

impl ExactSizeIterator for Sections {}

/// Writes a container to a byte sink.
#[derive(Debug)]
pub struct ContainerWriter<W: Write> {
    sink: W,
    written: u64,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    pub fn write_header(&mut self, header: &LtxHeader) -> Result<()> {
        self.write_bytes(header.as_bytes())
    }

    pub fn write_section(&mut self, section: &Section) -> Result<()> {
        match section {
            Section::Pages { pages, .. } => {
                for page in pages {
                    self.write_bytes(page.as_bytes())?;
                }
            }
            Section::Tail { bytes, .. } => self.write_bytes(bytes)?,
        }
        debug!(
            level = section.level(),
            bytes = section.byte_len(),
            "wrote section"
        );
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush the sink and return it.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Write a header and its sections, calling `on_section` after each one.
///
/// Fails if the byte count written differs from what the header describes.
pub fn write_container<W, I, F>(
    sink: W,
    header: &LtxHeader,
    sections: I,
    mut on_section: F,
) -> Result<u64>
where
    W: Write,
    I: IntoIterator<Item = Section>,
    F: FnMut(&Section),
{
    let mut writer = ContainerWriter::new(sink);
    writer.write_header(header)?;
    for section in sections {
        writer.write_section(&section)?;
        on_section(&section);
    }

    let written = writer.bytes_written();
    writer.finish()?;

    if written != header.file_size() {
        return Err(Error::InvalidHeader(format!(
            "wrote {written} bytes but the header describes {}",
            header.file_size()
        )));
    }
    Ok(written)
}

/// Path of the temporary file used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a file through a temporary sibling, renaming it into place on success.
///
/// On any error the temporary file is removed and `path` is left untouched.
pub fn write_atomically<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path(path);
    let result = write_and_sync(&temp, write).and_then(|value| {
        fs::rename(&temp, path)?;
        Ok(value)
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_and_sync<T, F>(temp: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T>,
{
    let mut writer = BufWriter::new(File::create(temp)?);
    let value = write(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(value)
}
