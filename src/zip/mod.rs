//! ZIP archive parsing and extraction.
//!
//! This is the zip layer the entry readers are built on. It answers two
//! questions about an entry: where its data sits inside the archive
//! ([`EntryMetadata`]), and what its content is once decrypted and
//! decompressed ([`ZipBackend::extract`]).
//!
//! - [`structures`]: on-disk records (EOCD, ZIP64, headers) and entry types
//! - [`parser`]: reads those records from any [`ReadAt`](crate::io::ReadAt) source
//! - `crypto`: traditional PKWARE decryption
//! - [`extractor`]: the [`ZipBackend`] implementation used by default
//!
//! ## Supported Features
//!
//! - Standard ZIP format and ZIP64 extensions
//! - STORED and DEFLATE compression methods
//! - Traditional PKWARE encryption
//!
//! ## Limitations
//!
//! - No AES encryption
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

pub mod crypto;
pub mod extractor;
mod options;
pub mod parser;
pub mod structures;

pub use extractor::{ZipBackend, ZipExtractor};
pub use options::{ExtractOptions, ProgressFn};
pub use parser::ZipParser;
pub use structures::*;
