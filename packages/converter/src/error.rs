use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("no chunk files found in {}", .0.display())]
    NoChunks(PathBuf),

    #[error("{step} ({}): {source}", .path.display())]
    Io {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg exited with {status}, output: {output}")]
    Ffmpeg { status: String, output: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ConverterError {
    pub fn io(step: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConverterError::Io {
            step,
            path: path.into(),
            source,
        }
    }

    /// Short description of the failing step, stored with the error record.
    pub fn step(&self) -> &'static str {
        match self {
            ConverterError::NoChunks(_) => "Failed to merge chunks",
            ConverterError::Io { step, .. } => step,
            ConverterError::Ffmpeg { .. } => "Error during video conversion",
            ConverterError::Database(_) => "Failed to update conversion state",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
