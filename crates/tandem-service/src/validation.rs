use thiserror::Error;

/// Longest file extension carried over from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    MissingField(&'static str),
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
    #[error("Unknown author: {0}")]
    UnknownAuthor(String),
    #[error("Too many photos: {count} (at most {max})")]
    TooManyPhotos { count: usize, max: usize },
    #[error("Photo {name} exceeds {max_bytes} bytes")]
    PhotoTooLarge { name: String, max_bytes: usize },
}

/// Presence check shared by every text field: trims, rejects empty.
pub fn require_text(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Extension (with leading dot) to keep on a stored photo, taken from the
/// client-supplied name only when it is short and alphanumeric.
pub fn upload_extension(original_name: Option<&str>) -> String {
    let Some(name) = original_name else {
        return String::new();
    };

    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Stored filenames are generated server-side; anything else is refused
/// before touching the upload directory.
pub fn is_stored_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
