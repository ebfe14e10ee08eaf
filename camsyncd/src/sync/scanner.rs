use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use camsync_core::{MediaCategory, MediaFileDescriptor, MimeResolver, classify};

/// Lists camera folders and keeps the entries belonging to one category.
#[derive(Clone)]
pub struct MediaScanner {
    resolver: Arc<dyn MimeResolver>,
}

/// A regular file found in a source directory, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListedFile {
    path: PathBuf,
    file_name: String,
    last_modified: i64,
}

impl MediaScanner {
    pub fn new(resolver: Arc<dyn MimeResolver>) -> Self {
        Self { resolver }
    }

    /// Non-recursive listing sorted ascending by modification time. Ties keep
    /// the order the platform listed them in. A missing or unreadable directory
    /// yields an empty list, and so does a listing that fails partway through.
    pub async fn scan(&self, directory: &Path, category: MediaCategory) -> Vec<MediaFileDescriptor> {
        let listing = list_directory(directory).await;
        self.select(directory, category, listing)
    }

    fn select(
        &self,
        directory: &Path,
        category: MediaCategory,
        listing: io::Result<Vec<ListedFile>>,
    ) -> Vec<MediaFileDescriptor> {
        let listing = match listing {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %directory.display(), %category, "source directory missing");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(
                    dir = %directory.display(),
                    %category,
                    "source directory not readable: {err}"
                );
                return Vec::new();
            }
        };

        let mut files: Vec<_> = listing
            .into_iter()
            .filter_map(|listed| {
                let (kind, mime_type) = classify(&listed.file_name, self.resolver.as_ref());
                (kind == category.kind()).then(|| MediaFileDescriptor {
                    absolute_path: listed.path,
                    file_name: listed.file_name,
                    mime_type,
                    last_modified: listed.last_modified,
                    kind,
                })
            })
            .collect();
        files.sort_by_key(|file| file.last_modified);
        files
    }
}

/// Reads every regular file of `directory`. Any error while iterating fails
/// the whole listing.
async fn list_directory(directory: &Path) -> io::Result<Vec<ListedFile>> {
    let mut entries = tokio::fs::read_dir(directory).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            tracing::debug!(path = %path.display(), "skipping entry without metadata");
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        let last_modified = match metadata.modified() {
            Ok(time) => system_time_millis(time),
            Err(err) => {
                tracing::debug!(path = %path.display(), "skipping entry without mtime: {err}");
                continue;
            }
        };
        files.push(ListedFile {
            path,
            file_name,
            last_modified,
        });
    }
    Ok(files)
}

fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis().min(i64::MAX as u128) as i64,
        Err(before) => -(before.duration().as_millis().min(i64::MAX as u128) as i64),
    }
}
