//! Entry readers.
//!
//! [`EntryByteReader`] is the public way to read an entry's bytes. A plain
//! stored entry is served in place from the archive blob through a
//! [`RangeReader`]; anything else (compressed or encrypted) is extracted
//! once at construction and served from the resulting [`MemoryBlob`].

mod range;

pub use crate::io::normalize_offset;
pub use range::RangeReader;

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;

use crate::io::{BlobReader, MemoryBlob, RangeRead, ReadAt};
use crate::zip::{EntryMetadata, ExtractOptions, ZipBackend, ZipExtractor, ZipFileEntry};

enum EntryBytes<B: ReadAt + ?Sized> {
    InPlace(RangeReader<B>),
    Extracted(BlobReader<MemoryBlob>),
}

/// Random-access reader over one entry of a zip archive held in a blob.
///
/// Immutable once built. Reads never fail because of the requested range:
/// out-of-range requests come back truncated or empty.
pub struct EntryByteReader<B: ReadAt + ?Sized> {
    inner: EntryBytes<B>,
    size: u64,
}

impl<B: ReadAt + ?Sized> EntryByteReader<B> {
    /// Build a reader for `entry` of the archive in `blob`.
    ///
    /// `options` only matter when the entry has to be extracted.
    ///
    /// # Errors
    ///
    /// Lookup and extraction failures are returned as-is: a missing or
    /// malformed local header, a missing or wrong password, an unsupported
    /// method, a corrupt stream or a checksum mismatch. A stored entry whose
    /// data would run past the end of `blob` is rejected as well.
    pub async fn create(blob: Arc<B>, entry: &ZipFileEntry, options: &ExtractOptions) -> Result<Self> {
        let backend = ZipExtractor::new(blob.clone());
        Self::create_with(&backend, blob, entry, options).await
    }

    /// Like [`create`](Self::create), with a caller-supplied zip backend.
    /// `backend` must describe the archive held in `blob`.
    pub async fn create_with<Z: ZipBackend + ?Sized>(
        backend: &Z,
        blob: Arc<B>,
        entry: &ZipFileEntry,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let meta = backend.entry_metadata(entry).await?;

        if !meta.is_range_readable() {
            log::debug!(
                "{}: method {}{}, extracting",
                entry.file_name,
                meta.compression_method.as_u16(),
                if meta.encrypted { " (encrypted)" } else { "" },
            );
            let extracted = backend.extract(entry, options).await?;
            return Ok(Self::extracted(extracted));
        }

        let end = meta.payload_offset().saturating_add(meta.compressed_size);
        if end > blob.size() {
            bail!(
                "{}: stored data [{}, {end}) extends past the end of the archive ({} bytes)",
                entry.file_name,
                meta.payload_offset(),
                blob.size()
            );
        }

        log::debug!(
            "{}: stored, reading {} bytes in place at offset {}",
            entry.file_name,
            meta.compressed_size,
            meta.payload_offset()
        );
        Ok(Self::in_place(blob, &meta))
    }

    /// Serve an entry directly from `blob` using already known metadata.
    /// No bounds or method checks are made.
    pub fn in_place(blob: Arc<B>, meta: &EntryMetadata) -> Self {
        let reader = RangeReader::new(blob, meta);
        let size = reader.size();
        Self {
            inner: EntryBytes::InPlace(reader),
            size,
        }
    }

    /// Serve already extracted entry content.
    pub fn extracted(content: MemoryBlob) -> Self {
        let reader = BlobReader::new(Arc::new(content));
        let size = reader.size();
        Self {
            inner: EntryBytes::Extracted(reader),
            size,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether reads go straight to the archive blob (no extraction happened).
    pub fn is_in_place(&self) -> bool {
        matches!(self.inner, EntryBytes::InPlace(_))
    }
}

#[async_trait]
impl<B: ReadAt + ?Sized> RangeRead for EntryByteReader<B> {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: i64, length: u64) -> Result<Vec<u8>> {
        match &self.inner {
            EntryBytes::InPlace(reader) => reader.read_range(offset, length).await,
            EntryBytes::Extracted(reader) => reader.read_range(offset, length).await,
        }
    }
}

/// Lets an entry be used as a blob in its own right, e.g. to open an
/// archive stored inside another archive.
#[async_trait]
impl<B: ReadAt + ?Sized> ReadAt for EntryByteReader<B> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Ok(offset) = i64::try_from(offset) else {
            return Ok(0);
        };
        if offset as u64 >= self.size || buf.is_empty() {
            return Ok(0);
        }
        let data = self.read_range(offset, buf.len() as u64).await?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
