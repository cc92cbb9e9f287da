pub mod config;
pub mod conversion;
pub mod conversion_status;
#[cfg(feature = "sea-orm")]
pub mod entity;
pub mod storage;

pub use conversion::ConversionJob;
pub use conversion_status::ConversionStatus;
