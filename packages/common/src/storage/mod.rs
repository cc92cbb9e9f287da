mod error;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemMediaStore;
pub use path::{split_extension, validate_relative_path};
pub use traits::{BoxReader, FileMeta, MediaStore, StoredFile};
