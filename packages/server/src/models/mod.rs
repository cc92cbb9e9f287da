pub mod admin;
pub mod auth;
pub mod conversion;
pub mod shared;
pub mod tag;
pub mod video;
