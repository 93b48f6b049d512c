use std::fmt;
use std::sync::Arc;

/// Called with `(bytes_done, bytes_total)` while an entry is extracted.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for extracting an entry into memory.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Password for encrypted entries; ignored for unencrypted ones.
    pub password: Option<Vec<u8>>,
    pub progress: Option<ProgressFn>,
    /// Check the CRC-32 and uncompressed size of the extracted data.
    pub verify_checksum: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            password: None,
            progress: None,
            verify_checksum: true,
        }
    }
}

impl ExtractOptions {
    pub fn with_password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn without_checksum(mut self) -> Self {
        self.verify_checksum = false;
        self
    }

    pub(crate) fn report(&self, done: u64, total: u64) {
        if let Some(progress) = &self.progress {
            progress(done, total);
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("progress", &self.progress.is_some())
            .field("verify_checksum", &self.verify_checksum)
            .finish()
    }
}
