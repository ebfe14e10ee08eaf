mod intent;
mod media;

pub use intent::{
    BehaviorAfterUpload, DEFAULT_REMOTE_DIR, PathError, REMOTE_SEPARATOR, UploadIntent,
    local_path_for, normalize_remote_dir, remote_path_for,
};
pub use media::{
    CategoryError, CreatedBy, ExtensionMimeResolver, FALLBACK_MIME_TYPE, MediaCategory,
    MediaFileDescriptor, MediaKind, MimeResolver, classify, kind_for_mime,
};
