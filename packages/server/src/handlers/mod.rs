pub mod admin;
pub mod auth;
pub mod conversion;
pub mod media;
pub mod tag;
pub mod video;
