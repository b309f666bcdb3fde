mod common;

use std::fs;

use anyhow::Result;
use common::{profile_with_key, store, write_profile};

#[test]
fn load_restores_the_backup_of_an_interrupted_save() -> Result<()> {
    let (_temp, manager) = store();
    write_profile(
        manager.paths().primary(),
        "sync",
        "bar",
        &profile_with_key("bar", "sync", "k", "v1"),
    );
    let profile_file = manager.paths().primary().join("sync/bar.xml");
    let backup_file = manager.paths().primary().join("sync/bar.xml.bak");

    // Simulate a crash mid-save: the backup holds the pre-save contents and
    // the profile file was truncated before the new contents landed.
    fs::write(&backup_file, profile_with_key("bar", "sync", "k", "v0"))?;
    fs::write(&profile_file, "")?;

    let profile = manager.profile("bar", "sync").expect("profile restored");
    assert_eq!(profile.key("k"), Some("v0"), "pre-save contents win");
    assert!(!backup_file.exists(), "backup consumed after the restore");
    assert!(
        fs::read_to_string(&profile_file)?.contains("v0"),
        "profile file rewritten from the backup"
    );
    Ok(())
}

#[test]
fn unparsable_backup_is_discarded() -> Result<()> {
    let (_temp, manager) = store();
    write_profile(
        manager.paths().primary(),
        "sync",
        "bar",
        &profile_with_key("bar", "sync", "k", "v1"),
    );
    let backup_file = manager.paths().primary().join("sync/bar.xml.bak");
    fs::write(&backup_file, "not xml at all <")?;

    let profile = manager.profile("bar", "sync").expect("profile loads");
    assert_eq!(profile.key("k"), Some("v1"));
    assert!(!backup_file.exists(), "garbage backup removed");
    Ok(())
}

// Pins the behavior of the old-file lookup in the save path: re-saving an
// existing profile goes through a backup, and a completed save leaves none.
#[test]
fn resave_of_an_existing_profile_cleans_up_its_backup() {
    let (_temp, manager) = store();
    write_profile(
        manager.paths().primary(),
        "sync",
        "bar",
        &profile_with_key("bar", "sync", "k", "v1"),
    );

    let mut profile = manager.profile("bar", "sync").expect("profile loads");
    profile.set_key("k", "v2");
    assert!(manager.save(&profile));

    let backup_file = manager.paths().primary().join("sync/bar.xml.bak");
    assert!(!backup_file.exists(), "backup removed after a complete save");
    let reloaded = manager.profile("bar", "sync").expect("profile reloads");
    assert_eq!(reloaded.key("k"), Some("v2"));
}

#[test]
fn first_save_over_a_secondary_default_backs_up_the_default() -> Result<()> {
    let (_temp, manager) = store();
    write_profile(
        manager.paths().secondary(),
        "sync",
        "foo",
        &profile_with_key("foo", "sync", "owner", "system"),
    );

    let mut profile = manager.profile("foo", "sync").expect("profile loads");
    profile.set_key("owner", "user");
    assert!(manager.save(&profile));

    // The write succeeded, so the transient backup of the secondary copy is
    // gone again and only the primary overlay remains.
    assert!(!manager.paths().primary().join("sync/foo.xml.bak").exists());
    assert!(manager.paths().primary().join("sync/foo.xml").exists());
    Ok(())
}
