use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A file written into the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the media root, e.g. `thumbnails/cover.png`.
    pub path: String,
    pub size: u64,
}

/// Size and modification time of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileMeta {
    /// Entity tag derived from size and modification time.
    pub fn etag(&self) -> String {
        format!(
            "\"{:x}-{:x}\"",
            self.modified.timestamp_micros(),
            self.size
        )
    }
}

/// Storage for uploaded media, addressed by paths relative to a media root.
///
/// Files are grouped in directories (`thumbnails/`, `videos/`). Storing a
/// file never overwrites an existing one: the store picks a free name and
/// returns it.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under `dir` using `filename` (or a free variant of it).
    async fn put(&self, dir: &str, filename: &str, data: &[u8]) -> Result<StoredFile, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(dir, filename, reader).await
    }

    /// Store data from an async reader under `dir`.
    async fn put_stream(
        &self,
        dir: &str,
        filename: &str,
        reader: BoxReader,
    ) -> Result<StoredFile, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a stored file as a streaming async reader.
    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Size and modification time of a stored file.
    async fn metadata(&self, path: &str) -> Result<FileMeta, StorageError>;
}
