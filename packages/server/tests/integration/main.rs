mod admin;
mod auth;
mod conversion;
mod tag;
mod video;
