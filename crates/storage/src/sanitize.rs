//! Untrusted identifier → filesystem-safe path component.

use crate::StorageError;

/// Upper bound on a sanitized component, in bytes (the output is ASCII).
pub const MAX_COMPONENT_LEN: usize = 128;

/// Map `value` onto `[A-Za-z0-9._-]`, replacing every other character with
/// `_`, and cap the result at [`MAX_COMPONENT_LEN`].
///
/// Leading and trailing whitespace is trimmed first.
///
/// # Errors
/// [`StorageError::InvalidComponent`] if nothing is left after trimming.
pub fn sanitize(value: &str) -> Result<String, StorageError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StorageError::InvalidComponent(
            "value cannot be empty".to_string(),
        ));
    }

    Ok(value
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => ch,
            _ => '_',
        })
        .take(MAX_COMPONENT_LEN)
        .collect())
}
