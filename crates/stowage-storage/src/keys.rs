//! Shared object-key validation for storage backends.
//!
//! Stored objects live under bare server-assigned names. Rejecting
//! separators here keeps every read path from doubling as a path-traversal
//! primitive.

use crate::traits::StoreError;

/// Validate that `file_name` is a bare object name.
///
/// Rejects empty names, path separators, and `..` so the name is safe to
/// join onto a scratch directory.
pub fn validate_bare_name(file_name: &str) -> Result<(), StoreError> {
    if file_name.is_empty() {
        return Err(StoreError::InvalidKey("file name is empty".to_string()));
    }
    if file_name.contains('/') || file_name.contains('\\') {
        return Err(StoreError::InvalidKey(format!(
            "file name '{}' contains a path separator",
            file_name
        )));
    }
    if file_name.contains("..") {
        return Err(StoreError::InvalidKey(format!(
            "file name '{}' contains '..'",
            file_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_pass() {
        assert!(validate_bare_name("A1B2C3D.jpg").is_ok());
        assert!(validate_bare_name("x.png").is_ok());
    }

    #[test]
    fn separators_are_rejected() {
        assert!(matches!(
            validate_bare_name("a/b.png"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_bare_name("a\\b.png"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_bare_name("/etc/passwd"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn dotdot_and_empty_are_rejected() {
        assert!(matches!(
            validate_bare_name(".."),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_bare_name(""),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
