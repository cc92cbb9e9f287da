//! Tables shared between the server (which queues conversions and reports
//! their state) and the converter (which performs them).

pub mod conversion_error;
pub mod video_conversion;
