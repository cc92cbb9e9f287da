//! Ordering and concatenation of uploaded chunk files.

use std::path::{Path, PathBuf};

use common::conversion::CHUNK_EXTENSION;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{ConverterError, Result};

const MERGE_STEP: &str = "Failed to merge chunks";

/// First run of ASCII digits in the file name, or -1 when there is none.
pub fn extract_number(file_name: &str) -> i64 {
    let digits: String = file_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(-1)
}

/// `*.chunk` files of `dir`, ordered by the number in their name.
pub async fn list_chunks(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ConverterError::io(MERGE_STEP, dir, e))?;

    let mut chunks = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConverterError::io(MERGE_STEP, dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == CHUNK_EXTENSION) && path.is_file() {
            chunks.push(path);
        }
    }

    chunks.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (extract_number(&name), name)
    });
    Ok(chunks)
}

/// Concatenate the chunks of `dir` into `output`. Returns the bytes written.
pub async fn merge_chunks(dir: &Path, output: &Path) -> Result<u64> {
    let chunks = list_chunks(dir).await?;
    if chunks.is_empty() {
        return Err(ConverterError::NoChunks(dir.to_path_buf()));
    }
    info!(path = %dir.display(), chunks = chunks.len(), "Merging chunks");

    let mut merged = tokio::fs::File::create(output)
        .await
        .map_err(|e| ConverterError::io(MERGE_STEP, output, e))?;

    let mut total = 0u64;
    for chunk in &chunks {
        let mut input = tokio::fs::File::open(chunk)
            .await
            .map_err(|e| ConverterError::io(MERGE_STEP, chunk, e))?;
        let copied = tokio::io::copy(&mut input, &mut merged)
            .await
            .map_err(|e| ConverterError::io(MERGE_STEP, chunk, e))?;
        debug!(chunk = %chunk.display(), bytes = copied, "Appended chunk");
        total += copied;
    }
    merged
        .flush()
        .await
        .map_err(|e| ConverterError::io(MERGE_STEP, output, e))?;

    Ok(total)
}
