pub mod role;
pub mod role_permission;
pub mod tag;
pub mod user;
pub mod video;
pub mod video_tag;
