//! Main entry point for the nestzip CLI application.
//!
//! Opens an archive, walks a path of entries through nested archives, and
//! either lists the innermost archive or prints a byte range of the final
//! entry.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

use nestzip::entry::normalize_offset;
use nestzip::zip::CompressionMethod;
use nestzip::{
    Cli, EntryByteReader, ExtractOptions, FileBlob, MemoryBlob, RangeRead, ReadAt, ZipExtractor,
};

/// Bytes copied to stdout per range read.
const PRINT_CHUNK: u64 = 1 << 20;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    let outer: Arc<dyn ReadAt> = if cli.from_disk {
        Arc::new(FileBlob::open(Path::new(&cli.archive))?)
    } else {
        let data = tokio::fs::read(&cli.archive)
            .await
            .with_context(|| format!("cannot read {}", cli.archive))?;
        Arc::new(MemoryBlob::from(data))
    };

    let options = extract_options(&cli);

    // Walk the path; every step but the last must be an archive
    let mut current = outer;
    let mut label = cli.archive.clone();
    let mut last = None;
    for name in &cli.path {
        let entry = ZipExtractor::new(current.clone())
            .find_file(name)
            .await
            .with_context(|| format!("in {label}"))?;
        let reader = Arc::new(EntryByteReader::create(current, &entry, &options).await?);
        label = format!("{label}/{name}");
        info!(
            "{label}: {} bytes, {}",
            reader.size(),
            if reader.is_in_place() { "read in place" } else { "extracted" }
        );
        let next: Arc<dyn ReadAt> = reader.clone();
        current = next;
        last = Some(reader);
    }

    match last {
        Some(reader) if !cli.is_listing() => print_range(reader.as_ref(), &cli).await,
        _ => list_files(current, cli.verbose).await,
    }
}

fn extract_options(cli: &Cli) -> ExtractOptions {
    let mut options = ExtractOptions::default();
    if let Some(password) = &cli.password {
        options = options.with_password(password.as_bytes());
    }
    if cli.quiet == 0 {
        // one message per tenth of the entry
        let reported = AtomicU64::new(0);
        options = options.with_progress(move |done, total| {
            if total == 0 {
                return;
            }
            let tenth = done.saturating_mul(10) / total;
            if tenth > reported.swap(tenth, Ordering::Relaxed) {
                info!("extracting: {}%", tenth.min(10) * 10);
            }
        });
    }
    options
}

/// Copy `[offset, offset + length)` of the entry to stdout.
async fn print_range(reader: &EntryByteReader<dyn ReadAt>, cli: &Cli) -> Result<()> {
    let size = reader.size();
    let start = normalize_offset(cli.offset, size);
    let end = start.saturating_add(cli.length.unwrap_or(size)).min(size);

    let mut stdout = tokio::io::stdout();
    let mut pos = start;
    while pos < end {
        let len = (end - pos).min(PRINT_CHUNK);
        let data = reader.read_range(pos as i64, len).await?;
        if data.is_empty() {
            break;
        }
        stdout.write_all(&data).await?;
        pos += data.len() as u64;
    }
    stdout.flush().await?;
    Ok(())
}

/// List files in an archive.
///
/// The verbose table marks with `*` the entries that can be read in place.
async fn list_files(archive: Arc<dyn ReadAt>, verbose: bool) -> Result<()> {
    let entries = ZipExtractor::new(archive).list_files().await?;

    if verbose {
        println!(
            "{:>10}  {:<7} {:>10}  {:>5}  {:>10}  {:>5}    Name",
            "Length", "Method", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(76));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let in_place = entry.compression_method == CompressionMethod::Stored && !entry.is_encrypted();

        println!(
            "{:>10}  {:<7} {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {} {}",
            entry.uncompressed_size,
            entry.compression_method.name(),
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            if in_place { '*' } else { ' ' },
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(76));
        println!(
            "{:>10}  {:<7} {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            "",
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

/// Space saved, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed >= uncompressed {
        return "  0%".to_string();
    }
    format!("{:>3}%", 100 - compressed * 100 / uncompressed)
}
