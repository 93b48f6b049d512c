use super::{RangeRead, ReadAt, read_span, resolve_range};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Whole-blob reader: reads absolute ranges of the blob it wraps.
///
/// Offsets resolve the same way as for entries read in place: negative
/// values count back from the end, and everything is clamped to the blob.
pub struct BlobReader<B: ReadAt + ?Sized> {
    blob: Arc<B>,
    size: u64,
}

impl<B: ReadAt + ?Sized> BlobReader<B> {
    pub fn new(blob: Arc<B>) -> Self {
        let size = blob.size();
        Self { blob, size }
    }

    pub fn blob(&self) -> &Arc<B> {
        &self.blob
    }
}

#[async_trait]
impl<B: ReadAt + ?Sized> RangeRead for BlobReader<B> {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: i64, length: u64) -> Result<Vec<u8>> {
        let (start, end) = resolve_range(offset, length, self.size);
        read_span(self.blob.as_ref(), start, end).await
    }
}
