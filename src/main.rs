//! Ltx CLI - Command-line tool converting images into LTX texture containers.
//!
//! This is the main entry point for the ltx command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use ltx::format::DEFAULT_OUTPUT;
use ltx::prelude::*;

/// Ltx - paged texture container tool
#[derive(Parser)]
#[command(name = "ltx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PNG, JPEG or EXR image into an LTX container
    Convert {
        /// Input image
        input: PathBuf,

        /// Output LTX file
        #[arg(short, long, env = "LTX_OUTPUT", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Bytes per page
        #[arg(long, env = "LTX_PAGE_SIZE", default_value_t = ltx::format::DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Stop halving once both dimensions reach this size
        #[arg(long, env = "LTX_MIN_MIP", default_value_t = ltx::format::DEFAULT_MIN_MIP_DIMENSION)]
        min_mip: u32,

        /// Maximum number of mip levels (1-16)
        #[arg(long, default_value_t = ltx::format::MAX_MIP_LEVELS)]
        max_levels: usize,

        /// Resampling filter used for mip generation
        #[arg(long, value_enum, default_value_t = Filter::Triangle)]
        filter: Filter,

        /// Convert 16-bit and float images to 8 bits per channel
        #[arg(long)]
        normalize: bool,
    },

    /// Print the header of an LTX container
    Inspect {
        /// LTX file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Filter> for ResizeFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => ResizeFilter::Nearest,
            Filter::Triangle => ResizeFilter::Triangle,
            Filter::CatmullRom => ResizeFilter::CatmullRom,
            Filter::Gaussian => ResizeFilter::Gaussian,
            Filter::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            page_size,
            min_mip,
            max_levels,
            filter,
            normalize,
        } => {
            let config = ConvertConfig {
                output,
                page_size,
                min_mip_dimension: min_mip,
                max_mip_levels: max_levels,
                filter: filter.into(),
                normalize_to_8bit: normalize,
            };
            cmd_convert(&input, &config)?;
        }
        Commands::Inspect { file } => {
            cmd_inspect(&file)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_convert(input: &Path, config: &ConvertConfig) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), config.output.display());

    config.validate().context("Invalid conversion settings")?;

    let start = Instant::now();
    let image = load_image(input).context("Failed to load input image")?;
    let last_modified = last_modified_time(input).context("Failed to read input metadata")?;

    let info = image.info();
    println!(
        "Loaded {}x{} image ({} channels, {} bytes per channel) in {:?}",
        info.width,
        info.height,
        info.channels,
        info.bytes_per_channel,
        start.elapsed()
    );

    let encoded = encode(image, last_modified, config).context("Failed to build texture layout")?;
    let header = *encoded.header();

    let pb = ProgressBar::new(encoded.section_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let written = write_atomically(&config.output, |sink| {
        encoded.write_to(sink, |section| {
            let label = match section {
                Section::Pages { level, pages } => format!("level {level}: {} pages", pages.len()),
                Section::Tail { start_level, .. } => format!("mip tail from level {start_level}"),
            };
            pb.set_message(label);
            pb.inc(1);
        })
    })
    .context("Failed to write LTX container")?;

    pb.finish_with_message("Done");
    println!(
        "Wrote {} bytes ({} levels, {} pages, tail from level {}) in {:?}",
        written,
        header.mip_level_count,
        header.page_count.get(),
        header.mip_tail_start,
        start.elapsed()
    );

    Ok(())
}

fn cmd_inspect(file: &Path) -> Result<()> {
    let data = fs::read(file).context("Failed to read input file")?;
    let header = LtxHeader::parse(&data).context("Failed to parse LTX header")?;

    println!("File:            {}", file.display());
    print!("{}", describe_header(&header, data.len() as u64)?);

    Ok(())
}

/// Human-readable listing of every header field and the level page index.
fn describe_header(header: &LtxHeader, file_len: u64) -> Result<String> {
    use std::fmt::Write;

    let (major, minor, build) = header.version();
    let [tile_width, tile_height, tile_depth] = header.page_resolution.map(|v| v.get());

    let mut out = String::new();
    writeln!(out, "Version:         {major}.{minor}.{build}")?;
    writeln!(out, "Last modified:   {}", header.last_modified.get())?;
    writeln!(
        out,
        "Dimensions:      {}x{}x{}",
        header.width.get(),
        header.height.get(),
        header.depth.get()
    )?;
    writeln!(out, "Format:          {}", header.pixel_format())?;
    writeln!(out, "Page resolution: {tile_width}x{tile_height}x{tile_depth}")?;
    writeln!(out, "Page size:       {}", header.page_size.get())?;
    writeln!(out, "Page count:      {}", header.page_count.get())?;
    writeln!(out, "Layer count:     {}", header.layer_count.get())?;
    writeln!(out, "Mip levels:      {}", header.mip_level_count)?;
    writeln!(out, "Mip tail start:  {}", header.mip_tail_start)?;
    writeln!(out, "Mip tail offset: {}", header.mip_tail_offset.get())?;
    writeln!(out, "Mip tail size:   {}", header.mip_tail_size.get())?;
    writeln!(out, "Data offset:     {}", header.data_offset.get())?;

    writeln!(out, "\nLevel page index:")?;
    for level in 0..header.mip_level_count as usize {
        if let Some(index) = header.page_index(level) {
            let tail = if level >= header.mip_tail_start as usize { " (tail)" } else { "" };
            writeln!(out, "  {level:>2}: {index}{tail}")?;
        }
    }

    let expected = header.file_size();
    if file_len != expected {
        writeln!(
            out,
            "\nWarning: file is {file_len} bytes, header describes {expected}"
        )?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use ltx::format::{
        assemble_header, plan_mip_extents, ImageInfo, MipTail, PageLayout, DEFAULT_PAGE_SIZE,
        MAX_MIP_LEVELS,
    };

    use super::*;

    fn small_header() -> LtxHeader {
        let info = ImageInfo {
            width: 4,
            height: 4,
            channels: 1,
            bytes_per_channel: 1,
        };
        let layout = PageLayout::new(DEFAULT_PAGE_SIZE, info.pixel_size()).unwrap();
        let extents = plan_mip_extents(info.extent(), 2, MAX_MIP_LEVELS);
        let tail = MipTail::resolve(&extents, &layout).unwrap();
        assemble_header(&info, &extents, &layout, &tail, 7).unwrap()
    }

    #[test]
    fn test_describe_header_lists_fields() {
        let header = small_header();
        let text = describe_header(&header, header.file_size()).unwrap();

        assert!(text.contains("Version:         1.0.0"));
        assert!(text.contains("Layer count:     1"));
        assert!(text.contains("Format:          R8"));
        assert!(text.contains("   1: 0 (tail)"));
        assert!(!text.contains("Warning"));
    }

    #[test]
    fn test_describe_header_flags_size_mismatch() {
        let header = small_header();
        let text = describe_header(&header, 10).unwrap();
        assert!(text.contains("Warning: file is 10 bytes, header describes 163"));
    }
}
