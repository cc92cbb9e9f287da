use std::path::{Path, PathBuf};
use std::process::Stdio;

use common::conversion::MANIFEST_FILE_NAME;
use tokio::process::Command;
use tracing::info;

use crate::error::{ConverterError, Result};

/// `ffmpeg -i <input> -f dash <manifest>`.
pub fn ffmpeg_command(ffmpeg_bin: &str, input: &Path, manifest: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg_bin);
    cmd.arg("-i")
        .arg(input)
        .arg("-f")
        .arg("dash")
        .arg(manifest)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Convert `input` into an MPEG-DASH stream inside `dash_dir`.
/// Returns the manifest path.
pub async fn convert_to_dash(ffmpeg_bin: &str, input: &Path, dash_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dash_dir)
        .await
        .map_err(|e| ConverterError::io("Failed to create mpeg-dash directory", dash_dir, e))?;

    let manifest = dash_dir.join(MANIFEST_FILE_NAME);
    let output = ffmpeg_command(ffmpeg_bin, input, &manifest)
        .output()
        .await
        .map_err(|e| ConverterError::io("Failed to run ffmpeg", ffmpeg_bin, e))?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(ConverterError::Ffmpeg {
            status: output.status.to_string(),
            output: combined,
        });
    }

    info!(path = %dash_dir.display(), "Converted to MPEG-DASH");
    Ok(manifest)
}
