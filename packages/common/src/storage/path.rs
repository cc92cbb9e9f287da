use super::error::StorageError;

/// Validate a media path: relative, `/`-separated, no empty, `.` or `..`
/// components, no backslashes or NUL bytes.
pub fn validate_relative_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path is empty".into()));
    }
    if path.starts_with('/') {
        return Err(StorageError::InvalidPath(format!("'{path}' is absolute")));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(StorageError::InvalidPath(format!(
            "'{path}' contains a forbidden character"
        )));
    }
    if path
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(StorageError::InvalidPath(format!(
            "'{path}' contains an empty or relative component"
        )));
    }
    Ok(())
}

/// Split a file name into stem and extension (including the dot).
///
/// A leading dot does not start an extension: `.env` has no extension.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(0) | None => (filename, ""),
        Some(pos) => filename.split_at(pos),
    }
}
