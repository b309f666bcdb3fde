#![allow(dead_code)]

use std::fs;
use std::path::Path;

use syncd_store::ProfileManager;
use tempfile::TempDir;

/// Opens a manager on fresh primary/secondary roots inside a tempdir.
///
/// # Panics
/// Panics if the temporary directory cannot be created.
pub fn store() -> (TempDir, ProfileManager) {
    let temp = tempfile::tempdir().expect("tempdir");
    let manager = ProfileManager::with_paths(
        temp.path().join("primary"),
        temp.path().join("secondary"),
    );
    (temp, manager)
}

/// Writes a profile file under `<root>/<type>/<name>.xml`.
///
/// # Panics
/// Panics if the directory or file cannot be created.
pub fn write_profile(root: &Path, profile_type: &str, name: &str, contents: &str) {
    let dir = root.join(profile_type);
    fs::create_dir_all(&dir).expect("profile type dir");
    fs::write(dir.join(format!("{name}.xml")), contents).expect("profile file");
}

/// A minimal profile document with one key.
#[must_use]
pub fn profile_with_key(name: &str, profile_type: &str, key: &str, value: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<profile name="{name}" type="{profile_type}">
    <key name="{key}" value="{value}"/>
</profile>
"#
    )
}
