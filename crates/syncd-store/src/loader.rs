//! Backup-aware profile load and save.
//!
//! A `<file>.xml.bak` sibling marks an interrupted save: the backup holds the
//! last known good contents. Loads restore from it when it parses and discard
//! it otherwise; saves create it before overwriting the target and remove it
//! only after the new contents are fully written.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use syncd_domain::{factory, Profile};

use crate::codec;
use crate::error::StoreError;
use crate::paths::ProfilePaths;

pub(crate) fn load_profile(paths: &ProfilePaths, name: &str, profile_type: &str) -> Option<Profile> {
    let path = paths.resolve(name, profile_type);
    let backup = ProfilePaths::backup_path(&path);

    restore_backup_if_found(&path, &backup);

    match codec::read_document(&path) {
        Ok(doc) => match factory::profile_from_element(&doc) {
            Ok(profile) => {
                if backup.exists() {
                    let _ = fs::remove_file(&backup);
                }
                Some(profile)
            }
            Err(err) => {
                warn!(name, profile_type, %err, "failed to load profile");
                None
            }
        },
        Err(StoreError::NotFound(_)) => {
            debug!(name, profile_type, "profile file not found");
            None
        }
        Err(err) => {
            warn!(name, profile_type, %err, "failed to load profile");
            None
        }
    }
}

pub(crate) fn save_profile(paths: &ProfilePaths, profile: &Profile) -> Result<(), StoreError> {
    let type_dir = paths.primary_type_dir(profile.profile_type());
    fs::create_dir_all(&type_dir).map_err(|source| StoreError::io(&type_dir, source))?;

    let target = paths.primary_profile_path(profile.name(), profile.profile_type());
    let backup = ProfilePaths::backup_path(&target);

    let current = paths.resolve(profile.name(), profile.profile_type());
    if current.exists() {
        if let Err(source) = fs::copy(&current, &backup) {
            let err = StoreError::BackupFailure {
                path: current.clone(),
                source,
            };
            warn!(%err, "continuing save without a backup");
        }
    }

    let document = profile.to_element(true);
    match codec::write_document(&target, &document) {
        Ok(()) => {
            // The write completed; the backup is no longer needed.
            if backup.exists() {
                let _ = fs::remove_file(&backup);
            }
            Ok(())
        }
        // Leave the backup in place so the next load restores from it.
        Err(err) => Err(err),
    }
}

fn restore_backup_if_found(path: &Path, backup: &Path) {
    if !backup.exists() {
        return;
    }
    warn!(
        path = %path.display(),
        "profile backup found, the profile file may be incomplete"
    );
    match codec::read_document(backup) {
        Ok(_) => {
            debug!(path = %path.display(), "restoring profile from backup");
            let _ = fs::remove_file(path);
            if let Err(err) = fs::copy(backup, path) {
                warn!(%err, "failed to restore profile from backup");
            }
        }
        Err(err) => {
            warn!(%err, "backup file is unreadable, discarding it");
            let _ = fs::remove_file(backup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn paths(temp: &tempfile::TempDir) -> ProfilePaths {
        ProfilePaths::new(temp.path().join("primary"), temp.path().join("secondary"))
    }

    #[test]
    fn save_then_load_round_trips_the_local_view() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = paths(&temp);

        let mut profile = Profile::new("foo", "sync");
        profile.set_key("owner", "user");
        profile.add_sub_profile(Profile::new("svc", "service"));
        save_profile(&paths, &profile)?;

        let loaded = load_profile(&paths, "foo", "sync").expect("profile loads");
        assert_eq!(loaded, profile);
        Ok(())
    }

    #[test]
    fn load_restores_a_parseable_backup_over_a_truncated_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = paths(&temp);
        let dir = paths.primary_type_dir("sync");
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("bar.xml.bak"),
            r#"<profile name="bar" type="sync"><key name="k" value="v0"/></profile>"#,
        )?;
        fs::write(dir.join("bar.xml"), "")?;

        let profile = load_profile(&paths, "bar", "sync").expect("restored profile");
        assert_eq!(profile.key("k"), Some("v0"));
        assert!(!dir.join("bar.xml.bak").exists(), "backup consumed");
        let restored = fs::read_to_string(dir.join("bar.xml"))?;
        assert!(restored.contains("v0"));
        Ok(())
    }

    #[test]
    fn load_discards_an_unparseable_backup() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = paths(&temp);
        let dir = paths.primary_type_dir("sync");
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("bar.xml"),
            r#"<profile name="bar" type="sync"><key name="k" value="v1"/></profile>"#,
        )?;
        fs::write(dir.join("bar.xml.bak"), "<profile")?;

        let profile = load_profile(&paths, "bar", "sync").expect("profile loads");
        assert_eq!(profile.key("k"), Some("v1"));
        assert!(!dir.join("bar.xml.bak").exists(), "garbage backup deleted");
        Ok(())
    }

    #[test]
    fn resave_creates_and_then_removes_a_backup() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = paths(&temp);

        let mut profile = Profile::new("foo", "sync");
        profile.set_key("rev", "1");
        save_profile(&paths, &profile)?;

        profile.set_key("rev", "2");
        save_profile(&paths, &profile)?;

        let target = paths.primary_profile_path("foo", "sync");
        assert!(!ProfilePaths::backup_path(&target).exists());
        let loaded = load_profile(&paths, "foo", "sync").expect("profile loads");
        assert_eq!(loaded.key("rev"), Some("2"));
        Ok(())
    }
}
