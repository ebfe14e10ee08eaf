use std::path::{Path, PathBuf};

use camsync_core::{BehaviorAfterUpload, DEFAULT_REMOTE_DIR, MediaCategory, normalize_remote_dir};
use thiserror::Error;

const DEFAULT_CAMERA_DIR: &str = "DCIM/Camera";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory is unavailable")]
    MissingHome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub enabled: bool,
    /// Read by the trigger only.
    pub wifi_only: bool,
    pub source_dir: PathBuf,
    /// Always ends with `/`.
    pub dest_dir: String,
    pub account: Option<String>,
    pub behavior: BehaviorAfterUpload,
}

/// Camera-upload settings resolved once per trigger firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    pub pictures: CategoryConfig,
    pub videos: CategoryConfig,
}

impl ConfigurationSnapshot {
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
        Ok(Self::from_lookup(|name| std::env::var(name).ok(), &home))
    }

    pub fn from_lookup<F>(lookup: F, home: &Path) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            pictures: category_from_lookup(&lookup, home, MediaCategory::Pictures),
            videos: category_from_lookup(&lookup, home, MediaCategory::Videos),
        }
    }

    pub fn category(&self, category: MediaCategory) -> &CategoryConfig {
        match category {
            MediaCategory::Pictures => &self.pictures,
            MediaCategory::Videos => &self.videos,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.pictures.enabled || self.videos.enabled
    }

    /// True when every enabled category is restricted to Wi-Fi.
    pub fn requires_unmetered_network(&self) -> bool {
        let enabled: Vec<_> = MediaCategory::ALL
            .iter()
            .map(|category| self.category(*category))
            .filter(|config| config.enabled)
            .collect();
        !enabled.is_empty() && enabled.iter().all(|config| config.wifi_only)
    }
}

fn category_from_lookup<F>(lookup: &F, home: &Path, category: MediaCategory) -> CategoryConfig
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = match category {
        MediaCategory::Pictures => "CAMSYNC_PICTURES",
        MediaCategory::Videos => "CAMSYNC_VIDEOS",
    };
    let var = |suffix: &str| {
        lookup(&format!("{prefix}_{suffix}"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let source_dir = var("SOURCE")
        .map(|value| expand_with_home(&value, home))
        .unwrap_or_else(|| default_source_dir(home, category));
    let dest_dir = normalize_remote_dir(&var("PATH").unwrap_or_else(|| DEFAULT_REMOTE_DIR.into()));

    CategoryConfig {
        enabled: parse_bool(var("ENABLED").as_deref(), false),
        wifi_only: parse_bool(var("WIFI_ONLY").as_deref(), false),
        source_dir,
        dest_dir,
        account: var("ACCOUNT"),
        behavior: BehaviorAfterUpload::from_setting(var("BEHAVIOUR").as_deref()),
    }
}

fn default_source_dir(home: &Path, category: MediaCategory) -> PathBuf {
    let xdg = match category {
        MediaCategory::Pictures => dirs::picture_dir(),
        MediaCategory::Videos => dirs::video_dir(),
    };
    xdg.unwrap_or_else(|| home.join(DEFAULT_CAMERA_DIR))
}

pub(crate) fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}

pub(crate) fn parse_bool(value: Option<&str>, default: bool) -> bool {
    value
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}
