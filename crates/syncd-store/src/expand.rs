//! Sub-profile expansion: load and merge every referenced sub-profile into
//! the root until a fixpoint.

use tracing::debug;

use syncd_domain::Profile;

use crate::loader;
use crate::paths::ProfilePaths;

/// Expands `root` in place. Each unloaded sub-profile reference is resolved
/// through the layered store and merged into the tree; merging can introduce
/// new references, so the walk repeats until the number of sub-profiles
/// stops growing. Already-loaded nodes are skipped, which also makes
/// reference cycles terminate.
pub(crate) fn expand_profile(paths: &ProfilePaths, root: &mut Profile) {
    if root.is_loaded() {
        return;
    }

    let mut previous = 0;
    let mut count = root.all_sub_profiles().len();
    while count > previous {
        for (name, profile_type) in pending_references(root) {
            match loader::load_profile(paths, &name, &profile_type) {
                Some(external) => root.merge(&external),
                None => {
                    debug!(
                        sub_profile = %name,
                        sub_profile_type = %profile_type,
                        referenced_from = root.name(),
                        "referenced sub-profile has no profile file"
                    );
                }
            }
            root.for_each_sub_profile_mut(&mut |sub| {
                if sub.name() == name && sub.profile_type() == profile_type {
                    sub.set_loaded(true);
                }
            });
        }
        previous = count;
        count = root.all_sub_profiles().len();
    }

    root.set_loaded(true);
}

fn pending_references(root: &Profile) -> Vec<(String, String)> {
    let mut pending: Vec<(String, String)> = Vec::new();
    root.for_each_sub_profile(&mut |sub| {
        if !sub.is_loaded() {
            let reference = (sub.name().to_string(), sub.profile_type().to_string());
            if !pending.contains(&reference) {
                pending.push(reference);
            }
        }
    });
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn write_profile(
        paths: &ProfilePaths,
        profile_type: &str,
        name: &str,
        body: &str,
    ) -> Result<()> {
        let dir = paths.primary_type_dir(profile_type);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(format!("{name}.xml")),
            format!(r#"<profile name="{name}" type="{profile_type}">{body}</profile>"#),
        )?;
        Ok(())
    }

    #[test]
    fn expansion_reaches_transitive_references() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = ProfilePaths::new(temp.path().join("p"), temp.path().join("s"));
        write_profile(&paths, "sync", "parent", r#"<profile name="svc" type="service"/>"#)?;
        write_profile(
            &paths,
            "service",
            "svc",
            r#"<profile name="st" type="storage"/><key name="endpoint" value="http://h"/>"#,
        )?;
        write_profile(&paths, "storage", "st", r#"<key name="path" value="/data"/>"#)?;

        let mut root = loader::load_profile(&paths, "parent", "sync").expect("parent loads");
        expand_profile(&paths, &mut root);

        assert!(root.is_loaded());
        let svc = root.sub_profile("svc", "service").expect("svc");
        assert_eq!(svc.key("endpoint"), Some("http://h"));
        assert!(svc.is_loaded());
        let st = svc.sub_profile("st", "storage").expect("st");
        assert_eq!(st.key("path"), Some("/data"));
        assert!(st.is_loaded());
        Ok(())
    }

    #[test]
    fn expansion_is_idempotent() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = ProfilePaths::new(temp.path().join("p"), temp.path().join("s"));
        write_profile(&paths, "sync", "parent", r#"<profile name="svc" type="service"/>"#)?;
        write_profile(&paths, "service", "svc", r#"<key name="endpoint" value="http://h"/>"#)?;

        let mut once = loader::load_profile(&paths, "parent", "sync").expect("parent loads");
        expand_profile(&paths, &mut once);
        let mut twice = once.clone();
        expand_profile(&paths, &mut twice);
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn reference_cycles_terminate() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = ProfilePaths::new(temp.path().join("p"), temp.path().join("s"));
        write_profile(&paths, "sync", "a", r#"<profile name="b" type="service"/>"#)?;
        write_profile(&paths, "service", "b", r#"<profile name="c" type="service"/>"#)?;
        write_profile(&paths, "service", "c", r#"<profile name="b" type="service"/>"#)?;

        let mut root = loader::load_profile(&paths, "a", "sync").expect("a loads");
        expand_profile(&paths, &mut root);
        assert!(root.is_loaded());
        for sub in root.all_sub_profiles() {
            assert!(sub.is_loaded(), "{} left unloaded", sub.name());
        }
        Ok(())
    }

    #[test]
    fn missing_references_are_tolerated() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = ProfilePaths::new(temp.path().join("p"), temp.path().join("s"));
        write_profile(&paths, "sync", "parent", r#"<profile name="ghost" type="service"/>"#)?;

        let mut root = loader::load_profile(&paths, "parent", "sync").expect("parent loads");
        expand_profile(&paths, &mut root);
        assert!(root.is_loaded());
        let ghost = root.sub_profile("ghost", "service").expect("reference kept");
        assert!(ghost.is_loaded(), "unresolvable reference still marked loaded");
        Ok(())
    }
}
