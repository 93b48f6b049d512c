use async_trait::async_trait;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::{MemoryBlob, ReadAt};
use anyhow::{Context, Result, bail};

use super::crypto;
use super::options::ExtractOptions;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, EntryMetadata, ZipFileEntry};

/// Decompression chunk, and the granularity of progress reports.
const CHUNK_SIZE: usize = 64 * 1024;

/// What an entry reader needs from a zip implementation: where an entry's
/// data sits, and a way to materialize it when it can't be read in place.
///
/// Both operations refer to the archive the backend was built over.
#[async_trait]
pub trait ZipBackend: Send + Sync {
    async fn entry_metadata(&self, entry: &ZipFileEntry) -> Result<EntryMetadata>;

    /// Decrypt and decompress `entry` into a new standalone blob.
    async fn extract(&self, entry: &ZipFileEntry, options: &ExtractOptions) -> Result<MemoryBlob>;
}

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    pub async fn find_file(&self, name: &str) -> Result<ZipFileEntry> {
        self.parser.find_file(name).await
    }

    pub async fn entry_metadata(&self, entry: &ZipFileEntry) -> Result<EntryMetadata> {
        self.parser.entry_metadata(entry).await
    }

    /// Extract file data to memory
    pub async fn extract_to_memory(
        &self,
        entry: &ZipFileEntry,
        options: &ExtractOptions,
    ) -> Result<MemoryBlob> {
        let meta = self.parser.entry_metadata(entry).await?;
        let start = meta.payload_offset();
        let end = start.saturating_add(meta.compressed_size);
        if end > self.parser.reader().size() {
            bail!("{}: entry data extends past the end of the archive", entry.file_name);
        }

        let mut raw = vec![0u8; meta.compressed_size as usize];
        let n = self.parser.reader().read_full_at(start, &mut raw).await?;
        if n < raw.len() {
            bail!("{}: short read of entry data", entry.file_name);
        }

        log::debug!(
            "extracting {} ({}, {} -> {} bytes{})",
            entry.file_name,
            entry.compression_method.name(),
            entry.compressed_size,
            entry.uncompressed_size,
            if entry.is_encrypted() { ", encrypted" } else { "" }
        );

        // Decryption and inflate are CPU bound; keep them off the async workers
        let entry = entry.clone();
        let options = options.clone();
        let data = tokio::task::spawn_blocking(move || decode_entry(&entry, raw, &options))
            .await
            .context("extraction task failed")??;

        Ok(MemoryBlob::from(data))
    }
}

#[async_trait]
impl<R: ReadAt + ?Sized> ZipBackend for ZipExtractor<R> {
    async fn entry_metadata(&self, entry: &ZipFileEntry) -> Result<EntryMetadata> {
        ZipExtractor::entry_metadata(self, entry).await
    }

    async fn extract(&self, entry: &ZipFileEntry, options: &ExtractOptions) -> Result<MemoryBlob> {
        self.extract_to_memory(entry, options).await
    }
}

/// Turn an entry's raw stored bytes into its content.
fn decode_entry(entry: &ZipFileEntry, mut raw: Vec<u8>, options: &ExtractOptions) -> Result<Vec<u8>> {
    let payload: &[u8] = if entry.is_encrypted() {
        let Some(password) = options.password.as_deref() else {
            bail!("{}: entry is encrypted and no password was given", entry.file_name);
        };
        crypto::decrypt_entry(&mut raw, password, crypto::check_byte(entry))
            .with_context(|| format!("{}: cannot decrypt entry", entry.file_name))?
    } else {
        &raw
    };

    let total = entry.uncompressed_size;
    let data = match entry.compression_method {
        CompressionMethod::Stored => {
            options.report(payload.len() as u64, total);
            payload.to_vec()
        }
        CompressionMethod::Deflate => inflate(payload, total, options)
            .with_context(|| format!("{}: corrupt deflate stream", entry.file_name))?,
        CompressionMethod::Unknown(method) => {
            bail!(
                "{}: unsupported compression method: {method}",
                entry.file_name
            );
        }
    };

    if options.verify_checksum {
        if data.len() as u64 != total {
            bail!(
                "{}: size mismatch: expected {total} bytes, got {}",
                entry.file_name,
                data.len()
            );
        }
        let crc = crc32fast::hash(&data);
        if crc != entry.crc32 {
            bail!(
                "{}: invalid checksum: expected {:08x}, got {crc:08x}",
                entry.file_name,
                entry.crc32
            );
        }
    }

    Ok(data)
}

fn inflate(payload: &[u8], total: u64, options: &ExtractOptions) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(payload);
    // the declared size is a hint only; cap it so a lying header can't
    // force a huge allocation up front
    let mut out = Vec::with_capacity(total.min(payload.len() as u64 * 4) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = decoder.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
        options.report(out.len() as u64, total);
    }
    Ok(out)
}
