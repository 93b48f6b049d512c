//! # nestzip
//!
//! Random-access reads of entries inside zip archives held as in-memory blobs.
//!
//! When an entry is stored without compression its bytes already sit, as-is,
//! inside the archive. [`EntryByteReader`] then serves reads straight from
//! that range of the outer blob: setup costs one local header read, and each
//! read copies only what was asked for. Compressed or encrypted entries are
//! extracted once into a new blob and read from there.
//!
//! The typical case is an archive nested inside another archive: the inner
//! archive is stored, so it can be opened and walked without extracting it.
//!
//! ## Features
//!
//! - In-place range reads of stored entries, with from-the-end offsets
//! - Fallback extraction for DEFLATE and traditionally encrypted entries
//! - Entry readers are blobs themselves, so nesting works to any depth
//! - ZIP64 archives and archives with trailing comments
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nestzip::{EntryByteReader, ExtractOptions, MemoryBlob, RangeRead, ZipExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let outer = Arc::new(MemoryBlob::from(std::fs::read("bundle.zip")?));
//!
//!     // Find the inner archive and open it without extracting it
//!     let entry = ZipExtractor::new(outer.clone()).find_file("inner.zip").await?;
//!     let inner = EntryByteReader::create(outer, &entry, &ExtractOptions::default()).await?;
//!
//!     // Last 22 bytes: the inner archive's End of Central Directory
//!     let tail = inner.read_range(-22, 22).await?;
//!     assert_eq!(&tail[..4], b"PK\x05\x06");
//!
//!     // The inner archive can be listed through the entry reader
//!     for file in ZipExtractor::new(Arc::new(inner)).list_files().await? {
//!         println!("{}", file.file_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod entry;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use entry::{EntryByteReader, RangeReader};
pub use io::{BlobReader, FileBlob, MemoryBlob, RangeRead, ReadAt};
pub use zip::{ExtractOptions, ZipBackend, ZipExtractor, ZipFileEntry};
