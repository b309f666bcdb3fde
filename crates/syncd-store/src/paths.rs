//! Layered profile path resolution: a user-writable primary root overlaying
//! read-only system defaults.

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use anyhow::{anyhow, Result};
use tracing::debug;

use syncd_domain::defs::TYPE_SYNC;

pub(crate) const FORMAT_EXT: &str = ".xml";
pub(crate) const BACKUP_EXT: &str = ".bak";
pub(crate) const LOG_EXT: &str = ".log";
pub(crate) const LOG_DIRECTORY: &str = "logs";

const DEFAULT_PRIMARY_SUFFIX: &str = ".sync/profiles";
const DEFAULT_SECONDARY_PATH: &str = "/etc/sync/profiles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePaths {
    primary: PathBuf,
    secondary: PathBuf,
}

impl ProfilePaths {
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        let paths = Self {
            primary: strip_trailing_separator(primary.into()),
            secondary: strip_trailing_separator(secondary.into()),
        };
        debug!(primary = %paths.primary.display(), "primary profile path");
        debug!(secondary = %paths.secondary.display(), "secondary profile path");
        paths
    }

    /// The conventional roots: `$HOME/.sync/profiles` over `/etc/sync/profiles`.
    ///
    /// # Errors
    ///
    /// Returns an error when the home directory cannot be determined.
    pub fn system_default() -> Result<Self> {
        let home = dirs_next::home_dir().ok_or_else(|| anyhow!("HOME not set"))?;
        Ok(Self::new(
            home.join(DEFAULT_PRIMARY_SUFFIX),
            PathBuf::from(DEFAULT_SECONDARY_PATH),
        ))
    }

    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    #[must_use]
    pub fn secondary(&self) -> &Path {
        &self.secondary
    }

    /// Resolves a profile to a concrete file: the primary copy if present,
    /// else the secondary, else the (not yet existing) primary path so that
    /// callers get a writeable location for creation.
    #[must_use]
    pub fn resolve(&self, name: &str, profile_type: &str) -> PathBuf {
        let primary = self.primary_profile_path(name, profile_type);
        if primary.exists() {
            return primary;
        }
        let secondary = self.secondary_profile_path(name, profile_type);
        if secondary.exists() {
            secondary
        } else {
            primary
        }
    }

    #[must_use]
    pub fn primary_profile_path(&self, name: &str, profile_type: &str) -> PathBuf {
        self.primary
            .join(profile_type)
            .join(format!("{name}{FORMAT_EXT}"))
    }

    #[must_use]
    pub fn secondary_profile_path(&self, name: &str, profile_type: &str) -> PathBuf {
        self.secondary
            .join(profile_type)
            .join(format!("{name}{FORMAT_EXT}"))
    }

    #[must_use]
    pub fn primary_type_dir(&self, profile_type: &str) -> PathBuf {
        self.primary.join(profile_type)
    }

    #[must_use]
    pub fn secondary_type_dir(&self, profile_type: &str) -> PathBuf {
        self.secondary.join(profile_type)
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.primary.join(TYPE_SYNC).join(LOG_DIRECTORY)
    }

    #[must_use]
    pub fn log_path(&self, profile_name: &str) -> PathBuf {
        self.log_dir()
            .join(format!("{profile_name}{LOG_EXT}{FORMAT_EXT}"))
    }

    #[must_use]
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut raw: OsString = path.as_os_str().to_os_string();
        raw.push(BACKUP_EXT);
        PathBuf::from(raw)
    }
}

fn strip_trailing_separator(path: PathBuf) -> PathBuf {
    if let Some(raw) = path.to_str() {
        let trimmed = raw.trim_end_matches(MAIN_SEPARATOR);
        if trimmed.len() != raw.len() && !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    path
}
