use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::io::{RangeRead, ReadAt, read_span, resolve_range};
use crate::zip::EntryMetadata;

/// Reads a stored entry's data straight out of the archive blob that
/// contains it.
///
/// Nothing is copied up front; each read copies only the requested range.
pub struct RangeReader<B: ReadAt + ?Sized> {
    blob: Arc<B>,
    payload_offset: u64,
    size: u64,
}

impl<B: ReadAt + ?Sized> RangeReader<B> {
    pub fn new(blob: Arc<B>, meta: &EntryMetadata) -> Self {
        Self {
            blob,
            payload_offset: meta.payload_offset(),
            size: meta.compressed_size,
        }
    }

    /// Absolute offset of the entry's first byte in the blob.
    pub fn payload_offset(&self) -> u64 {
        self.payload_offset
    }
}

#[async_trait]
impl<B: ReadAt + ?Sized> RangeRead for RangeReader<B> {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: i64, length: u64) -> Result<Vec<u8>> {
        let (start, end) = resolve_range(offset, length, self.size);
        log::trace!(
            "range read [{start}, {end}) at blob offset {}",
            self.payload_offset
        );
        read_span(
            self.blob.as_ref(),
            self.payload_offset.saturating_add(start),
            self.payload_offset.saturating_add(end),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBlob;
    use crate::zip::CompressionMethod;

    /// 1000-byte blob whose byte at `i` is `i % 256`, with a 100-byte entry
    /// behind a 30-byte local header at offset 10.
    fn reader() -> RangeReader<MemoryBlob> {
        let blob = MemoryBlob::from((0..1000u32).map(|i| i as u8).collect::<Vec<_>>());
        let meta = EntryMetadata {
            offset: 10,
            local_file_header_size: 30,
            compressed_size: 100,
            compression_method: CompressionMethod::Stored,
            encrypted: false,
        };
        RangeReader::new(Arc::new(blob), &meta)
    }

    fn outer(range: std::ops::Range<u32>) -> Vec<u8> {
        range.map(|i| i as u8).collect()
    }

    #[tokio::test]
    async fn reads_whole_entry_from_its_blob_range() {
        let reader = reader();
        assert_eq!(reader.size(), 100);
        assert_eq!(reader.payload_offset(), 40);
        assert_eq!(reader.read_range(0, 100).await.unwrap(), outer(40..140));
    }

    #[tokio::test]
    async fn negative_offsets_count_from_the_end() {
        let reader = reader();
        assert_eq!(reader.read_range(-10, 10).await.unwrap(), outer(130..140));
        for k in [1i64, 7, 99, 100] {
            let tail = reader.read_range(-k, k as u64).await.unwrap();
            assert_eq!(tail, outer(140 - k as u32..140));
        }
    }

    #[tokio::test]
    async fn clamps_to_the_entry_not_the_blob() {
        let reader = reader();
        assert_eq!(reader.read_range(0, 1100).await.unwrap(), outer(40..140));
        assert_eq!(reader.read_range(95, 50).await.unwrap(), outer(135..140));
        assert!(reader.read_range(100, 10).await.unwrap().is_empty());
        assert!(reader.read_range(5000, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sub_ranges_match_slices_of_the_payload() {
        let reader = reader();
        let payload = reader.read_range(0, 100).await.unwrap();
        for (a, b) in [(0u64, 0u64), (0, 1), (13, 57), (50, 100), (99, 100)] {
            let got = reader.read_range(a as i64, b - a).await.unwrap();
            assert_eq!(got, payload[a as usize..b as usize]);
        }
    }

    #[tokio::test]
    async fn zero_length_and_extreme_requests() {
        let reader = reader();
        assert!(reader.read_range(10, 0).await.unwrap().is_empty());
        assert!(reader.read_range(-3, 0).await.unwrap().is_empty());
        assert_eq!(reader.read_range(i64::MIN, u64::MAX).await.unwrap().len(), 100);
        assert_eq!(reader.read_range(-5, 2).await.unwrap(), outer(135..137));
    }

    #[tokio::test]
    async fn oversized_metadata_truncates_to_the_blob() {
        let blob = MemoryBlob::from((0..1000u32).map(|i| i as u8).collect::<Vec<_>>());
        let meta = EntryMetadata {
            offset: 10,
            local_file_header_size: 30,
            compressed_size: 1 << 46,
            compression_method: CompressionMethod::Stored,
            encrypted: false,
        };
        let reader = RangeReader::new(Arc::new(blob), &meta);
        assert_eq!(reader.read_range(0, u64::MAX).await.unwrap(), outer(40..1000));
        assert!(reader.read_range(-10, 10).await.unwrap().is_empty());
    }
}
