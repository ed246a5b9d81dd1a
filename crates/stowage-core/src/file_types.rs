//! Media type and suffix mapping
//!
//! Only the two image formats the upload pipeline accepts. Unknown types
//! are rejected at the authorization endpoint, before a name is assigned.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FileTypeError {
    #[error("no media type known for suffix '{0}'")]
    UnknownSuffix(String),

    #[error("no suffix known for media type '{0}'")]
    UnknownMediaType(String),

    #[error("file name '{0}' has no suffix")]
    MissingSuffix(String),
}

/// Media type for a bare suffix, e.g. `jpg` -> `image/jpeg`.
pub fn media_type_for_suffix(suffix: &str) -> Result<&'static str, FileTypeError> {
    match suffix.to_lowercase().as_str() {
        "jpeg" | "jpg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        other => Err(FileTypeError::UnknownSuffix(other.to_string())),
    }
}

/// Suffix files of a media type are stored under, e.g. `image/jpeg` -> `jpg`.
pub fn suffix_for_media_type(media_type: &str) -> Result<&'static str, FileTypeError> {
    match media_type.to_lowercase().as_str() {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        other => Err(FileTypeError::UnknownMediaType(other.to_string())),
    }
}

/// Media type derived from a stored file name's suffix.
pub fn media_type_for_file_name(file_name: &str) -> Result<&'static str, FileTypeError> {
    let suffix = file_name
        .rsplit_once('.')
        .map(|(_, suffix)| suffix)
        .ok_or_else(|| FileTypeError::MissingSuffix(file_name.to_string()))?;
    media_type_for_suffix(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_suffixes_share_a_media_type() {
        assert_eq!(media_type_for_suffix("jpeg").unwrap(), "image/jpeg");
        assert_eq!(media_type_for_suffix("jpg").unwrap(), "image/jpeg");
        assert_eq!(media_type_for_suffix("JPG").unwrap(), "image/jpeg");
    }

    #[test]
    fn media_types_map_back_to_storage_suffixes() {
        assert_eq!(suffix_for_media_type("image/jpeg").unwrap(), "jpg");
        assert_eq!(suffix_for_media_type("image/png").unwrap(), "png");
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert_eq!(
            media_type_for_suffix("gif"),
            Err(FileTypeError::UnknownSuffix("gif".to_string()))
        );
        assert_eq!(
            suffix_for_media_type("image/webp"),
            Err(FileTypeError::UnknownMediaType("image/webp".to_string()))
        );
    }

    #[test]
    fn file_names_resolve_through_their_suffix() {
        assert_eq!(
            media_type_for_file_name("A1B2C3D.png").unwrap(),
            "image/png"
        );
        assert_eq!(
            media_type_for_file_name("noext"),
            Err(FileTypeError::MissingSuffix("noext".to_string()))
        );
    }
}
