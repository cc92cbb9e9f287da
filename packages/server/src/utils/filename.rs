use std::path::Path;

/// Longest stored file name, in bytes.
const MAX_NAME_LEN: usize = 100;

/// Longest kept extension, in bytes (without the dot).
const MAX_EXT_LEN: usize = 16;

/// Stem used when nothing of the client's stem survives sanitising.
const FALLBACK_STEM: &str = "upload";

/// Reasons an uploaded file name cannot be used.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Nothing usable remains after sanitising.
    Empty,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "The submitted file has no usable name",
        }
    }
}

/// Turn a client-supplied file name into a safe flat name.
///
/// Only the last path component is kept, whitespace becomes `_`, and every
/// character other than ASCII letters, digits, `-`, `_` and `.` is dropped.
/// A stem that vanishes entirely is replaced by `upload` so the extension
/// survives. Names longer than 100 bytes are shortened, keeping at most 16
/// bytes of extension.
pub fn sanitize_upload_name(raw: &str) -> Result<String, FilenameError> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let path = Path::new(base);
    let raw_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    // No hidden files; this also disposes of `.` and `..`.
    let stem = clean_name_part(raw_stem).trim_start_matches('.').to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(clean_name_part)
        .filter(|e| !e.is_empty());

    let mut stem = match (stem.is_empty(), &ext) {
        (true, None) => return Err(FilenameError::Empty),
        (true, Some(_)) => FALLBACK_STEM.to_string(),
        (false, _) => stem,
    };

    let Some(mut ext) = ext else {
        stem.truncate(MAX_NAME_LEN);
        return Ok(stem);
    };
    ext.truncate(MAX_EXT_LEN);
    stem.truncate(MAX_NAME_LEN - 1 - ext.len());
    Ok(format!("{stem}.{ext}"))
}

/// Keep the characters allowed in stored names. The result is pure ASCII.
fn clean_name_part(part: &str) -> String {
    part.chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            _ => None,
        })
        .collect()
}

/// Lower-cased extension of a file name, if any.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Last component of a stored media path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Build a safe `Content-Disposition` header value.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
