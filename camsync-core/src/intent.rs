use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::{CreatedBy, MediaCategory};

pub const REMOTE_SEPARATOR: char = '/';
pub const DEFAULT_REMOTE_DIR: &str = "/CameraUpload";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("file name is empty")]
    EmptyFileName,
    #[error("file name must not contain a path separator: {0}")]
    NestedFileName(String),
}

/// What happens to the local file once the transfer subsystem has uploaded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorAfterUpload {
    Move,
    #[default]
    Forget,
}

impl BehaviorAfterUpload {
    /// Only a case-insensitive `"MOVE"` selects [`BehaviorAfterUpload::Move`].
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.trim().eq_ignore_ascii_case("MOVE") => BehaviorAfterUpload::Move,
            _ => BehaviorAfterUpload::Forget,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorAfterUpload::Move => "move",
            BehaviorAfterUpload::Forget => "forget",
        }
    }
}

impl fmt::Display for BehaviorAfterUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadIntent {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub account: Option<String>,
    pub behavior: BehaviorAfterUpload,
    pub mime_type: String,
    pub create_parent: bool,
    pub created_by: CreatedBy,
}

impl UploadIntent {
    pub fn for_file(
        category: MediaCategory,
        source_dir: &Path,
        dest_dir: &str,
        file_name: &str,
        mime_type: &str,
        account: Option<&str>,
        behavior: BehaviorAfterUpload,
    ) -> Result<Self, PathError> {
        Ok(Self {
            local_path: local_path_for(source_dir, file_name)?,
            remote_path: remote_path_for(dest_dir, file_name)?,
            account: account.map(str::to_string),
            behavior,
            mime_type: mime_type.to_string(),
            create_parent: true,
            created_by: category.created_by(),
        })
    }
}

/// Ensures a remote directory ends with exactly one trailing separator.
pub fn normalize_remote_dir(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return REMOTE_SEPARATOR.to_string();
    }
    let mut out = trimmed.trim_end_matches(REMOTE_SEPARATOR).to_string();
    out.push(REMOTE_SEPARATOR);
    out
}

/// `dest_dir` is expected to be normalized already.
pub fn remote_path_for(dest_dir: &str, file_name: &str) -> Result<String, PathError> {
    check_file_name(file_name)?;
    Ok(format!("{dest_dir}{file_name}"))
}

pub fn local_path_for(source_dir: &Path, file_name: &str) -> Result<PathBuf, PathError> {
    check_file_name(file_name)?;
    Ok(source_dir.join(file_name))
}

fn check_file_name(file_name: &str) -> Result<(), PathError> {
    if file_name.is_empty() {
        return Err(PathError::EmptyFileName);
    }
    if file_name.contains(REMOTE_SEPARATOR) {
        return Err(PathError::NestedFileName(file_name.to_string()));
    }
    Ok(())
}
