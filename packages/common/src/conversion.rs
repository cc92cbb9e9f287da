use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extension of raw upload chunks awaiting conversion.
pub const CHUNK_EXTENSION: &str = "chunk";

/// Name of the intermediate file the chunks are merged into.
pub const MERGED_FILE_NAME: &str = "merged.mp4";

/// Directory (inside the chunk directory) receiving the MPEG-DASH output.
pub const DASH_DIR_NAME: &str = "mpeg-dash";

/// MPEG-DASH manifest written by ffmpeg.
pub const MANIFEST_FILE_NAME: &str = "output.mpd";

/// A request to turn the uploaded chunks of one video into MPEG-DASH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub job_id: String,
    pub video_id: i32,
    /// Directory holding the `*.chunk` files of the video.
    pub path: String,
}

impl ConversionJob {
    pub fn new(video_id: i32, path: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::now_v7().to_string(),
            video_id,
            path: path.into(),
        }
    }
}

/// Directory holding the chunks of a video: `{upload_root}/{video_id}`.
pub fn chunk_dir(upload_root: &Path, video_id: i32) -> PathBuf {
    upload_root.join(video_id.to_string())
}

/// File name of the chunk with the given index, e.g. `3.chunk`.
pub fn chunk_file_name(index: u32) -> String {
    format!("{index}.{CHUNK_EXTENSION}")
}

/// Location of the DASH manifest produced for a chunk directory.
pub fn manifest_path(chunk_dir: &Path) -> PathBuf {
    chunk_dir.join(DASH_DIR_NAME).join(MANIFEST_FILE_NAME)
}
