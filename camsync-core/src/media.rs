use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("unknown media category: {0}")]
    Unknown(String),
}

/// Coarse media kind used to route a file to its camera-upload category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Picture,
    Video,
    Other,
}

/// A category that owns its own watermark, source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Pictures,
    Videos,
}

impl MediaCategory {
    /// Processing order for one run.
    pub const ALL: [MediaCategory; 2] = [MediaCategory::Pictures, MediaCategory::Videos];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Pictures => "pictures",
            MediaCategory::Videos => "videos",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaCategory::Pictures => MediaKind::Picture,
            MediaCategory::Videos => MediaKind::Video,
        }
    }

    pub fn created_by(&self) -> CreatedBy {
        match self {
            MediaCategory::Pictures => CreatedBy::CameraUploadPicture,
            MediaCategory::Videos => CreatedBy::CameraUploadVideo,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = CategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pictures" | "picture" => Ok(MediaCategory::Pictures),
            "videos" | "video" => Ok(MediaCategory::Videos),
            other => Err(CategoryError::Unknown(other.to_string())),
        }
    }
}

/// Origin tag attached to every upload requested by the camera sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatedBy {
    #[serde(rename = "camera-upload-picture")]
    CameraUploadPicture,
    #[serde(rename = "camera-upload-video")]
    CameraUploadVideo,
}

impl CreatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedBy::CameraUploadPicture => "camera-upload-picture",
            CreatedBy::CameraUploadVideo => "camera-upload-video",
        }
    }
}

/// Resolves a MIME type from a file name. Implementations must not read file
/// contents.
pub trait MimeResolver: Send + Sync {
    fn mime_for(&self, file_name: &str) -> String;
}

/// Extension table lookup backed by `mime_guess`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMimeResolver;

impl MimeResolver for ExtensionMimeResolver {
    fn mime_for(&self, file_name: &str) -> String {
        mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string()
    }
}

pub fn kind_for_mime(mime_type: &str) -> MediaKind {
    if mime_type.starts_with("image/") {
        MediaKind::Picture
    } else if mime_type.starts_with("video/") {
        MediaKind::Video
    } else {
        MediaKind::Other
    }
}

/// Classifies a file name, returning the kind together with the resolved MIME
/// type so callers do not resolve twice.
pub fn classify<R: MimeResolver + ?Sized>(file_name: &str, resolver: &R) -> (MediaKind, String) {
    let mime_type = resolver.mime_for(file_name);
    (kind_for_mime(&mime_type), mime_type)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFileDescriptor {
    pub absolute_path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    /// Modification time in epoch milliseconds.
    pub last_modified: i64,
    pub kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(&'static str);

    impl MimeResolver for FixedResolver {
        fn mime_for(&self, _file_name: &str) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn kind_follows_mime_prefix() {
        assert_eq!(kind_for_mime("image/heic"), MediaKind::Picture);
        assert_eq!(kind_for_mime("video/quicktime"), MediaKind::Video);
        assert_eq!(kind_for_mime("audio/mpeg"), MediaKind::Other);
        assert_eq!(kind_for_mime(FALLBACK_MIME_TYPE), MediaKind::Other);
    }

    #[test]
    fn classify_uses_injected_resolver() {
        let (kind, mime) = classify("anything.bin", &FixedResolver("video/mp4"));
        assert_eq!(kind, MediaKind::Video);
        assert_eq!(mime, "video/mp4");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let resolver = ExtensionMimeResolver;
        assert_eq!(resolver.mime_for("core.zzzunknown"), FALLBACK_MIME_TYPE);
        assert_eq!(resolver.mime_for("Makefile"), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn category_parses_singular_and_plural() {
        assert_eq!(
            "Pictures".parse::<MediaCategory>().unwrap(),
            MediaCategory::Pictures
        );
        assert_eq!(
            "video".parse::<MediaCategory>().unwrap(),
            MediaCategory::Videos
        );
        assert!(matches!(
            "audio".parse::<MediaCategory>(),
            Err(CategoryError::Unknown(_))
        ));
    }

    #[test]
    fn created_by_tag_matches_category() {
        assert_eq!(
            MediaCategory::Pictures.created_by().as_str(),
            "camera-upload-picture"
        );
        assert_eq!(
            MediaCategory::Videos.created_by().as_str(),
            "camera-upload-video"
        );
    }
}
