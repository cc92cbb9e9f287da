use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::path::{split_extension, validate_relative_path};
use super::traits::{BoxReader, FileMeta, MediaStore, StoredFile};

/// Length of the random suffix appended when a file name is taken.
const SUFFIX_LEN: usize = 7;

/// How many suffixed names to try before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Filesystem-backed media store.
///
/// Files live at `{root}/{dir}/{filename}`. Writes go to `{root}/.tmp` first
/// and are hard-linked into place, so a finished name never points at a
/// partial file and an existing file is never replaced.
pub struct FilesystemMediaStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_relative_path(path)?;
        Ok(self.root.join(path))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }

    /// Link the finished temp file to `dir/filename`, or to a suffixed
    /// variant when that name is already taken.
    async fn link_into_place(
        &self,
        temp_path: &std::path::Path,
        dir: &str,
        filename: &str,
    ) -> Result<String, StorageError> {
        let (stem, ext) = split_extension(filename);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                filename.to_string()
            } else {
                format!("{stem}_{}{ext}", random_suffix())
            };
            let relative = format!("{dir}/{name}");
            let target = self.resolve(&relative)?;
            match fs::hard_link(temp_path, &target).await {
                Ok(()) => return Ok(relative),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::NameExhausted(format!("{dir}/{filename}")))
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put_stream(
        &self,
        dir: &str,
        filename: &str,
        mut reader: BoxReader,
    ) -> Result<StoredFile, StorageError> {
        validate_relative_path(dir)?;
        if filename.contains('/') {
            return Err(StorageError::InvalidPath(format!(
                "file name '{filename}' contains a separator"
            )));
        }
        validate_relative_path(filename)?;

        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        fs::create_dir_all(self.root.join(dir)).await?;

        let linked = self.link_into_place(&temp_path, dir, filename).await;
        let _ = fs::remove_file(&temp_path).await;
        let path = linked?;
        debug!(path = %path, size = total_bytes, "Stored media file");

        Ok(StoredFile {
            path,
            size: total_bytes,
        })
    }

    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError> {
        let full = self.resolve(path)?;
        match fs::File::open(&full).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn metadata(&self, path: &str) -> Result<FileMeta, StorageError> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(FileMeta {
                size: meta.len(),
                modified: DateTime::<Utc>::from(meta.modified()?),
            }),
            Ok(_) => Err(StorageError::NotFound(path.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
