mod common;

use std::fs;

use anyhow::Result;
use common::{store, write_profile};

fn write_merge_fixture(manager: &syncd_store::ProfileManager) {
    write_profile(
        manager.paths().primary(),
        "sync",
        "parent",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<profile name="parent" type="sync">
    <profile name="svc" type="service"/>
</profile>
"#,
    );
    write_profile(
        manager.paths().primary(),
        "service",
        "svc",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<profile name="svc" type="service">
    <profile name="st" type="storage"/>
    <key name="endpoint" value="http://h"/>
</profile>
"#,
    );
    write_profile(
        manager.paths().primary(),
        "storage",
        "st",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<profile name="st" type="storage">
    <key name="path" value="/data"/>
</profile>
"#,
    );
}

#[test]
fn sync_profile_merges_sub_profiles_to_a_fixpoint() {
    let (_temp, manager) = store();
    write_merge_fixture(&manager);

    let parent = manager.sync_profile("parent").expect("parent loads");
    assert!(parent.is_loaded());

    let svc = parent.sub_profile("svc", "service").expect("svc merged");
    assert_eq!(svc.key("endpoint"), Some("http://h"));
    assert!(svc.is_loaded());

    let st = svc.sub_profile("st", "storage").expect("st merged transitively");
    assert_eq!(st.key("path"), Some("/data"));
    assert!(st.is_loaded());
}

#[test]
fn sync_profile_attaches_an_empty_log_when_none_exists() {
    let (_temp, manager) = store();
    write_merge_fixture(&manager);

    let parent = manager.sync_profile("parent").expect("parent loads");
    let log = parent.log().expect("log attached");
    assert_eq!(log.profile_name(), "parent");
    assert!(log.results().is_empty());
}

#[test]
fn sync_profile_rejects_a_file_with_a_foreign_type() {
    let (_temp, manager) = store();
    write_profile(
        manager.paths().primary(),
        "sync",
        "odd",
        r#"<profile name="odd" type="storage"/>"#,
    );

    assert!(manager.profile("odd", "sync").is_some(), "plain load succeeds");
    assert!(manager.sync_profile("odd").is_none(), "type mismatch discards");
}

#[test]
fn saving_an_expanded_profile_keeps_the_reference_shape() -> Result<()> {
    let (_temp, manager) = store();
    write_merge_fixture(&manager);

    let parent = manager.sync_profile("parent").expect("parent loads");
    assert!(manager.save(&parent));

    let raw = fs::read_to_string(manager.paths().primary().join("sync/parent.xml"))?;
    assert!(
        !raw.contains("endpoint"),
        "merged service content is not inlined: {raw}"
    );
    assert!(
        !raw.contains(r#"name="st""#),
        "merged storage node is not inlined: {raw}"
    );
    assert!(raw.contains(r#"name="svc""#), "reference survives: {raw}");
    Ok(())
}

#[test]
fn storage_enabled_after_expansion_is_persisted() -> Result<()> {
    let (_temp, manager) = store();
    write_merge_fixture(&manager);

    let mut parent = manager.sync_profile("parent").expect("parent loads");
    let storages = std::collections::BTreeMap::from([("st".to_string(), true)]);
    manager.enable_storages(&mut parent, &storages);
    assert!(manager.save(&parent));

    let raw = fs::read_to_string(manager.paths().primary().join("sync/parent.xml"))?;
    assert!(
        raw.contains(r#"name="st""#) && raw.contains(r#"name="enabled""#),
        "locally flipped storage flag survives the save: {raw}"
    );

    let reloaded = manager.sync_profile("parent").expect("parent reloads");
    let st = reloaded.sub_profile("st", "storage").expect("st");
    assert!(st.is_enabled());
    Ok(())
}
