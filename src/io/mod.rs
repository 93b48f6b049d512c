mod blob;
mod local;
mod memory;

pub use blob::BlobReader;
pub use local::FileBlob;
pub use memory::MemoryBlob;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than requested; `Ok(0)` means the source has
    /// no data at `offset`.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Keep calling [`read_at`](Self::read_at) until `buf` is full or the
    /// source runs out of data. Returns the number of bytes filled.
    async fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

/// Reader capability over a logical byte sequence.
///
/// This is what callers (and the zip layer, for nested archives) read
/// entries through. Offsets are relative to the logical sequence, not to
/// whatever blob backs it.
#[async_trait]
pub trait RangeRead: Send + Sync {
    /// Logical length in bytes.
    fn size(&self) -> u64;

    /// Read `length` bytes starting at `offset`.
    ///
    /// How out-of-range or negative offsets are treated is up to the
    /// implementation, but none of the readers in this crate fail on them.
    async fn read_range(&self, offset: i64, length: u64) -> Result<Vec<u8>>;
}

/// Map a position in a sequence of `size` bytes onto `[0, size]`.
///
/// Negative values count back from the end (and stop at zero), other values
/// are clamped to `size`.
pub fn normalize_offset(value: i64, size: u64) -> u64 {
    if value < 0 {
        size.saturating_sub(value.unsigned_abs())
    } else {
        (value as u64).min(size)
    }
}

/// Resolve `(offset, length)` to `[start, end)` within `[0, size]`.
///
/// The end is taken from the resolved start, so `(-k, k)` means the last k
/// bytes rather than the empty range ending at position 0.
pub(crate) fn resolve_range(offset: i64, length: u64, size: u64) -> (u64, u64) {
    let start = normalize_offset(offset, size);
    (start, start.saturating_add(length).min(size))
}

/// Read the absolute range `[start, end)` of `source`, truncated to
/// whatever the source can actually supply.
pub(crate) async fn read_span<R: ReadAt + ?Sized>(source: &R, start: u64, end: u64) -> Result<Vec<u8>> {
    let end = end.min(source.size());
    if end <= start {
        return Ok(Vec::new());
    }
    let len = usize::try_from(end - start).context("range does not fit in memory")?;
    let mut buf = vec![0u8; len];
    let n = source.read_full_at(start, &mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}
