use std::path::{Path, PathBuf};

use common::ConversionJob;
use common::conversion::{DASH_DIR_NAME, MERGED_FILE_NAME};
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument, warn};

use crate::chunks::merge_chunks;
use crate::dash::convert_to_dash;
use crate::error::Result;
use crate::store;

/// Merge the chunks of a job and convert them to MPEG-DASH.
/// Returns the manifest path.
pub async fn convert(job: &ConversionJob, ffmpeg_bin: &str) -> Result<PathBuf> {
    let dir = Path::new(&job.path);
    let merged = dir.join(MERGED_FILE_NAME);

    merge_chunks(dir, &merged).await?;
    let manifest = convert_to_dash(ffmpeg_bin, &merged, &dir.join(DASH_DIR_NAME)).await?;

    match tokio::fs::remove_file(&merged).await {
        Ok(()) => info!(file = %merged.display(), "Removed merged file"),
        Err(e) => warn!(file = %merged.display(), error = %e, "Failed to remove merged file"),
    }

    Ok(manifest)
}

/// Handle one conversion job end to end. Failures are recorded, never
/// returned, so the message is always acknowledged.
#[instrument(skip(db, ffmpeg_bin), fields(video_id = job.video_id, job_id = %job.job_id))]
pub async fn process_job(db: &DatabaseConnection, job: &ConversionJob, ffmpeg_bin: &str) {
    match store::is_processed(db, job.video_id).await {
        Ok(true) => {
            warn!("Video already processed");
            return;
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Failed to read conversion state");
            return;
        }
    }

    if let Err(e) = store::mark_processing(db, job).await {
        error!(error = %e, "Failed to mark conversion as processing");
    }

    let result = match convert(job, ffmpeg_bin).await {
        Ok(manifest) => {
            info!(manifest = %manifest.display(), "Video conversion processed");
            store::mark_completed(db, job, manifest.to_string_lossy().into_owned())
                .await
                .map_err(Into::into)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => info!("Video marked as processed"),
        Err(e) => {
            error!(step = e.step(), details = %e, "Processing error");
            if let Err(db_err) = store::register_error(db, job, e.step(), &e.to_string()).await {
                error!(error = %db_err, "Failed to register conversion error");
            }
            if let Err(db_err) = store::mark_failed(db, job).await {
                error!(error = %db_err, "Failed to mark conversion as failed");
            }
        }
    }
}
