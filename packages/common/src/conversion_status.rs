#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of a video's MPEG-DASH conversion.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum ConversionStatus {
    /// Job published, waiting for a converter.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Queued"))]
    Queued,
    /// A converter is merging chunks or running ffmpeg.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Processing"))]
    Processing,
    /// Manifest written.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Completed"))]
    Completed,
    /// Last attempt failed; see the recorded conversion errors.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Failed"))]
    Failed,
}

impl ConversionStatus {
    /// Returns true once the video has been converted.
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true while a job is queued or running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    pub const ALL: &'static [ConversionStatus] =
        &[Self::Queued, Self::Processing, Self::Completed, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid conversion status '{}'. Valid values: {}",
            self.invalid,
            ConversionStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for ConversionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConversionStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
