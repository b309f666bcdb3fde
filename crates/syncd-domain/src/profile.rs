//! Profile tree model.
//!
//! A profile is an open, user-editable configuration tree: string keys,
//! declared settings fields and nested sub-profile references. Sync profiles
//! carry an extra block (`SyncExtras`) instead of being a subclass; callers
//! test the tag with [`Profile::is_sync`].
//!
//! Every key and field entry tracks whether it is local (came from the
//! profile's own document or a caller mutation) or merged in from an external
//! sub-profile definition. Serialization of the local view writes only local
//! entries, so the on-disk form stays the non-expanded one.

use std::collections::BTreeMap;

use crate::defs::{
    ATTR_NAME, ATTR_TYPE, ATTR_VALUE, BOOLEAN_FALSE, BOOLEAN_TRUE, KEY_ENABLED, KEY_HIDDEN,
    KEY_PROTECTED, NAME_SEPARATOR, TAG_FIELD, TAG_KEY, TAG_OPTION, TAG_PROFILE, TYPE_SYNC,
};
use crate::log::SyncLog;
use crate::schedule::SyncSchedule;
use crate::xml::Element;

/// A profile-declared setting: type, default value and allowed options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    pub field_type: String,
    pub default: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyEntry {
    value: String,
    local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldEntry {
    spec: FieldSpec,
    local: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncType {
    #[default]
    Manual,
    Scheduled,
}

/// The sync-profile tag: schedule, sync type and the attached log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncExtras {
    pub sync_type: SyncType,
    pub schedule: Option<SyncSchedule>,
    pub log: Option<SyncLog>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    profile_type: String,
    keys: BTreeMap<String, KeyEntry>,
    fields: BTreeMap<String, FieldEntry>,
    sub_profiles: Vec<Profile>,
    loaded: bool,
    merged: bool,
    sync: Option<Box<SyncExtras>>,
}

impl Profile {
    #[must_use]
    pub fn new(name: impl Into<String>, profile_type: impl Into<String>) -> Self {
        let profile_type = profile_type.into();
        let sync = (profile_type == TYPE_SYNC).then(|| Box::new(SyncExtras::default()));
        Self {
            name: name.into(),
            profile_type,
            keys: BTreeMap::new(),
            fields: BTreeMap::new(),
            sub_profiles: Vec::new(),
            loaded: false,
            merged: false,
            sync,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sets a compound name from its segments.
    pub fn set_name_parts(&mut self, parts: &[&str]) {
        self.name = parts.join(&NAME_SEPARATOR.to_string());
    }

    #[must_use]
    pub fn name_parts(&self) -> Vec<&str> {
        self.name.split(NAME_SEPARATOR).collect()
    }

    #[must_use]
    pub fn profile_type(&self) -> &str {
        &self.profile_type
    }

    #[must_use]
    pub fn key(&self, name: &str) -> Option<&str> {
        self.keys.get(name).map(|entry| entry.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.value.as_str()))
    }

    pub fn set_key(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.keys.insert(
            name.into(),
            KeyEntry {
                value: value.into(),
                local: true,
            },
        );
    }

    pub fn set_bool_key(&mut self, name: &str, value: bool) {
        self.set_key(name, if value { BOOLEAN_TRUE } else { BOOLEAN_FALSE });
    }

    pub fn remove_key(&mut self, name: &str) {
        self.keys.remove(name);
    }

    /// Enabled unless explicitly disabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.key(KEY_ENABLED) != Some(BOOLEAN_FALSE)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.set_bool_key(KEY_ENABLED, enabled);
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.key(KEY_HIDDEN) == Some(BOOLEAN_TRUE)
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.set_bool_key(KEY_HIDDEN, hidden);
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.key(KEY_PROTECTED) == Some(BOOLEAN_TRUE)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name).map(|entry| &entry.spec)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.spec))
    }

    pub fn set_field(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.fields.insert(name.into(), FieldEntry { spec, local: true });
    }

    #[must_use]
    pub fn sub_profiles(&self) -> &[Profile] {
        &self.sub_profiles
    }

    pub fn add_sub_profile(&mut self, sub: Profile) {
        self.sub_profiles.push(sub);
    }

    /// First descendant with the given name and type, in document order.
    /// An empty `profile_type` matches any type.
    #[must_use]
    pub fn sub_profile(&self, name: &str, profile_type: &str) -> Option<&Profile> {
        for sub in &self.sub_profiles {
            if sub.matches(name, profile_type) {
                return Some(sub);
            }
            if let Some(found) = sub.sub_profile(name, profile_type) {
                return Some(found);
            }
        }
        None
    }

    pub fn sub_profile_mut(&mut self, name: &str, profile_type: &str) -> Option<&mut Profile> {
        for sub in &mut self.sub_profiles {
            if sub.matches(name, profile_type) {
                return Some(sub);
            }
            if let Some(found) = sub.sub_profile_mut(name, profile_type) {
                return Some(found);
            }
        }
        None
    }

    /// Names of all descendants with the given type, in document order.
    #[must_use]
    pub fn sub_profile_names(&self, profile_type: &str) -> Vec<String> {
        let mut names = Vec::new();
        self.for_each_sub_profile(&mut |sub| {
            if sub.profile_type == profile_type {
                names.push(sub.name.clone());
            }
        });
        names
    }

    /// All descendant profiles flattened in document order.
    #[must_use]
    pub fn all_sub_profiles(&self) -> Vec<&Profile> {
        let mut all = Vec::new();
        collect_sub_profiles(self, &mut all);
        all
    }

    pub fn for_each_sub_profile(&self, visit: &mut dyn FnMut(&Profile)) {
        for sub in &self.sub_profiles {
            visit(sub);
            sub.for_each_sub_profile(visit);
        }
    }

    pub fn for_each_sub_profile_mut(&mut self, visit: &mut dyn FnMut(&mut Profile)) {
        for sub in &mut self.sub_profiles {
            visit(sub);
            sub.for_each_sub_profile_mut(visit);
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    #[must_use]
    pub fn is_sync(&self) -> bool {
        self.sync.is_some()
    }

    #[must_use]
    pub fn sync(&self) -> Option<&SyncExtras> {
        self.sync.as_deref()
    }

    pub fn sync_mut(&mut self) -> Option<&mut SyncExtras> {
        self.sync.as_deref_mut()
    }

    #[must_use]
    pub fn sync_type(&self) -> SyncType {
        self.sync.as_ref().map(|extras| extras.sync_type).unwrap_or_default()
    }

    pub fn set_sync_type(&mut self, sync_type: SyncType) {
        if let Some(extras) = self.sync.as_deref_mut() {
            extras.sync_type = sync_type;
        }
    }

    #[must_use]
    pub fn schedule(&self) -> Option<&SyncSchedule> {
        self.sync.as_deref().and_then(|extras| extras.schedule.as_ref())
    }

    pub fn set_schedule(&mut self, schedule: SyncSchedule) {
        if let Some(extras) = self.sync.as_deref_mut() {
            extras.schedule = Some(schedule);
        }
    }

    #[must_use]
    pub fn log(&self) -> Option<&SyncLog> {
        self.sync.as_deref().and_then(|extras| extras.log.as_ref())
    }

    /// Attaches a log; ignored for non-sync profiles.
    pub fn set_log(&mut self, log: SyncLog) {
        if let Some(extras) = self.sync.as_deref_mut() {
            extras.log = Some(log);
        }
    }

    /// Overlays an externally loaded sub-profile definition onto the matching
    /// node of this tree. Entries taken from `external` replace same-named
    /// ones and are marked merged; sub-profiles the node does not yet carry
    /// are appended as merged nodes. Idempotent.
    pub fn merge(&mut self, external: &Profile) {
        if let Some(node) = self.sub_profile_mut(&external.name, &external.profile_type) {
            node.overlay(external);
        }
    }

    fn overlay(&mut self, external: &Profile) {
        for (name, entry) in &external.keys {
            self.keys.insert(
                name.clone(),
                KeyEntry {
                    value: entry.value.clone(),
                    local: false,
                },
            );
        }
        for (name, entry) in &external.fields {
            self.fields.insert(
                name.clone(),
                FieldEntry {
                    spec: entry.spec.clone(),
                    local: false,
                },
            );
        }
        for sub in &external.sub_profiles {
            if let Some(existing) = self
                .sub_profiles
                .iter_mut()
                .find(|child| child.name == sub.name && child.profile_type == sub.profile_type)
            {
                existing.overlay(sub);
            } else {
                let mut appended = sub.clone();
                appended.mark_merged();
                self.sub_profiles.push(appended);
            }
        }
    }

    fn mark_merged(&mut self) {
        self.merged = true;
        for sub in &mut self.sub_profiles {
            sub.mark_merged();
        }
    }

    fn matches(&self, name: &str, profile_type: &str) -> bool {
        self.name == name && (profile_type.is_empty() || self.profile_type == profile_type)
    }

    fn has_local_data(&self) -> bool {
        self.keys.values().any(|entry| entry.local)
            || self.fields.values().any(|entry| entry.local)
            || self
                .sub_profiles
                .iter()
                .any(|sub| !sub.merged || sub.has_local_data())
    }

    /// Serializes this profile as an XML element. With `local_only` the
    /// element carries the non-expanded view: only local keys and fields,
    /// and no merged nodes without local data.
    #[must_use]
    pub fn to_element(&self, local_only: bool) -> Element {
        let mut element = Element::new(TAG_PROFILE);
        element.set_attr(ATTR_NAME, &self.name);
        element.set_attr(ATTR_TYPE, &self.profile_type);

        for (name, entry) in &self.keys {
            if local_only && !entry.local {
                continue;
            }
            let mut key = Element::new(TAG_KEY);
            key.set_attr(ATTR_NAME, name);
            key.set_attr(ATTR_VALUE, &entry.value);
            element.push_child(key);
        }

        for (name, entry) in &self.fields {
            if local_only && !entry.local {
                continue;
            }
            let mut field = Element::new(TAG_FIELD);
            field.set_attr(ATTR_NAME, name);
            if !entry.spec.field_type.is_empty() {
                field.set_attr(ATTR_TYPE, &entry.spec.field_type);
            }
            if !entry.spec.default.is_empty() {
                field.set_attr("default", &entry.spec.default);
            }
            for option in &entry.spec.options {
                let mut child = Element::new(TAG_OPTION);
                child.set_attr(ATTR_VALUE, option);
                field.push_child(child);
            }
            element.push_child(field);
        }

        if let Some(extras) = self.sync.as_deref() {
            if extras.sync_type == SyncType::Scheduled {
                if let Some(schedule) = &extras.schedule {
                    element.push_child(schedule.to_element());
                }
            }
        }

        for sub in &self.sub_profiles {
            if local_only && sub.merged && !sub.has_local_data() {
                continue;
            }
            element.push_child(sub.to_element(local_only));
        }

        element
    }
}

fn collect_sub_profiles<'a>(profile: &'a Profile, out: &mut Vec<&'a Profile>) {
    for sub in &profile.sub_profiles {
        out.push(sub);
        collect_sub_profiles(sub, out);
    }
}
