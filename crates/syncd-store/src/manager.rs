//! The profile manager facade.
//!
//! Every operation is synchronous and self-contained: profiles are loaded
//! from disk on each call, returned trees are owned by the caller and the
//! manager keeps no cache. Failures never propagate as errors across this
//! surface; getters return `None`, mutators return `false` and anomalies go
//! to the log.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use syncd_domain::defs::{
    BOOLEAN_FALSE, BOOLEAN_TRUE, KEY_BT_ADDRESS, KEY_BT_NAME, KEY_DESTINATION_TYPE,
    KEY_DISPLAY_NAME, KEY_ENABLED, KEY_HIDDEN, KEY_REMOTE_ID, TYPE_SERVICE, TYPE_STORAGE,
    TYPE_SYNC, VALUE_ONLINE,
};
use syncd_domain::{
    factory, xml, MatchType, Profile, SearchCriteria, SyncLog, SyncResults, SyncSchedule, SyncType,
};

use crate::error::StoreError;
use crate::oracle::{DeviceOracle, COMPUTER_DEVICE_CLASS};
use crate::paths::{ProfilePaths, FORMAT_EXT};
use crate::{expand, loader, logstore, search};

/// Name of the sync profile cloned when templating a Bluetooth device.
pub const BT_PROFILE_TEMPLATE: &str = "bt_template";

/// Display name used for devices that do not report one.
pub const DEFAULT_DEVICE_DISPLAY_NAME: &str = "Unnamed device";

pub struct ProfileManager {
    paths: ProfilePaths,
}

impl ProfileManager {
    /// Opens the store on the conventional roots.
    ///
    /// # Errors
    ///
    /// Returns an error when the home directory cannot be determined.
    pub fn open() -> Result<Self> {
        Ok(Self {
            paths: ProfilePaths::system_default()?,
        })
    }

    #[must_use]
    pub fn with_paths(primary: impl Into<std::path::PathBuf>, secondary: impl Into<std::path::PathBuf>) -> Self {
        Self {
            paths: ProfilePaths::new(primary, secondary),
        }
    }

    #[must_use]
    pub fn paths(&self) -> &ProfilePaths {
        &self.paths
    }

    /// Loads a profile without expanding its sub-profile references.
    #[must_use]
    pub fn profile(&self, name: &str, profile_type: &str) -> Option<Profile> {
        loader::load_profile(&self.paths, name, profile_type)
    }

    /// Loads a sync profile: cold read, sub-profile expansion and log
    /// attachment. Returns `None` when the profile is missing or its
    /// declared type is not `sync`.
    #[must_use]
    pub fn sync_profile(&self, name: &str) -> Option<Profile> {
        let mut profile = self.profile(name, TYPE_SYNC)?;
        if profile.profile_type() != TYPE_SYNC {
            let err = StoreError::TypeMismatch {
                name: name.to_string(),
                expected: TYPE_SYNC.to_string(),
                actual: profile.profile_type().to_string(),
            };
            warn!(%err, "discarding profile with unexpected type");
            return None;
        }

        expand::expand_profile(&self.paths, &mut profile);

        if profile.log().is_none() {
            let log = logstore::load_log(&self.paths, name)
                .unwrap_or_else(|| SyncLog::new(name));
            profile.set_log(log);
        }
        Some(profile)
    }

    /// Profile names of one type across both roots; the secondary only
    /// contributes names the primary does not already have.
    #[must_use]
    pub fn profile_names(&self, profile_type: &str) -> Vec<String> {
        let mut names = list_profile_names(&self.paths.primary_type_dir(profile_type));
        for name in list_profile_names(&self.paths.secondary_type_dir(profile_type)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    #[must_use]
    pub fn all_sync_profiles(&self) -> Vec<Profile> {
        self.profile_names(TYPE_SYNC)
            .iter()
            .filter_map(|name| self.sync_profile(name))
            .collect()
    }

    #[must_use]
    pub fn all_visible_sync_profiles(&self) -> Vec<Profile> {
        let mut profiles = self.all_sync_profiles();
        profiles.retain(|profile| !profile.is_hidden());
        profiles
    }

    /// Sync profiles satisfying every criterion in `criteria`.
    #[must_use]
    pub fn sync_profiles_by_data(&self, criteria: &[SearchCriteria]) -> Vec<Profile> {
        self.all_sync_profiles()
            .into_iter()
            .filter(|profile| {
                criteria
                    .iter()
                    .all(|criterion| search::match_profile(profile, criterion))
            })
            .collect()
    }

    /// The single-predicate query form: reduce each sync profile to a test
    /// profile (itself, a named sub-profile, or the first sub-profile of a
    /// type) and keep it when the key check passes. Profiles whose
    /// sub-profile lookup fails are discarded.
    #[must_use]
    pub fn sync_profiles_matching(
        &self,
        sub_profile_name: &str,
        sub_profile_type: &str,
        key: &str,
        value: &str,
    ) -> Vec<Profile> {
        self.all_sync_profiles()
            .into_iter()
            .filter(|profile| {
                let test = if !sub_profile_name.is_empty() {
                    profile.sub_profile(sub_profile_name, sub_profile_type)
                } else if !sub_profile_type.is_empty() {
                    let names = profile.sub_profile_names(sub_profile_type);
                    names
                        .first()
                        .and_then(|name| profile.sub_profile(name, sub_profile_type))
                } else {
                    Some(profile)
                };
                let Some(test) = test else {
                    return false;
                };
                if key.is_empty() {
                    return true;
                }
                match test.key(key) {
                    None => false,
                    Some(found) => value.is_empty() || found == value,
                }
            })
            .collect()
    }

    /// Enabled, visible sync profiles targeting an online service that
    /// support the given storage (optionally requiring it enabled).
    #[must_use]
    pub fn sync_profiles_by_storage(
        &self,
        storage_name: &str,
        storage_must_be_enabled: bool,
    ) -> Vec<Profile> {
        let mut criteria = Vec::new();

        // Enabled by default: the key may be missing entirely, so compare
        // against the disabled literal instead of requiring enabled=true.
        let mut profile_enabled = SearchCriteria::new(MatchType::NotEqual);
        profile_enabled.key = KEY_ENABLED.to_string();
        profile_enabled.value = BOOLEAN_FALSE.to_string();
        criteria.push(profile_enabled);

        let mut profile_visible = SearchCriteria::new(MatchType::NotEqual);
        profile_visible.key = KEY_HIDDEN.to_string();
        profile_visible.value = BOOLEAN_TRUE.to_string();
        criteria.push(profile_visible);

        let mut online_service = SearchCriteria::new(MatchType::Equal);
        online_service.sub_profile_type = TYPE_SERVICE.to_string();
        online_service.key = KEY_DESTINATION_TYPE.to_string();
        online_service.value = VALUE_ONLINE.to_string();
        criteria.push(online_service);

        let mut storage_supported = SearchCriteria::new(MatchType::Exists);
        storage_supported.sub_profile_name = storage_name.to_string();
        storage_supported.sub_profile_type = TYPE_STORAGE.to_string();
        if storage_must_be_enabled {
            // Storages are disabled by default, so here enabled=true is the
            // right comparison.
            storage_supported.match_type = MatchType::Equal;
            storage_supported.key = KEY_ENABLED.to_string();
            storage_supported.value = BOOLEAN_TRUE.to_string();
        }
        criteria.push(storage_supported);

        self.sync_profiles_by_data(&criteria)
    }

    /// Persists the profile's own (non-expanded) data under the primary
    /// root, with the backup protocol around the write.
    #[must_use]
    pub fn save(&self, profile: &Profile) -> bool {
        match loader::save_profile(&self.paths, profile) {
            Ok(()) => true,
            Err(err) => {
                warn!(profile = profile.name(), %err, "failed to save profile");
                false
            }
        }
    }

    /// Removes a profile from the primary root. Protected profiles and
    /// secondary defaults are never removed. Returns true iff the primary
    /// profile file was deleted; the log file removal is best-effort.
    #[must_use]
    pub fn remove(&self, name: &str, profile_type: &str) -> bool {
        let Some(profile) = loader::load_profile(&self.paths, name, profile_type) else {
            debug!(name, profile_type, "profile not found, nothing to remove");
            return false;
        };
        if profile.is_protected() {
            let err = StoreError::Protected(name.to_string());
            debug!(%err, "refusing to remove profile");
            return false;
        }

        let path = self.paths.primary_profile_path(name, profile_type);
        if let Err(err) = fs::remove_file(&path) {
            debug!(name, profile_type, %err, "no primary profile file to remove");
            return false;
        }

        if profile_type == TYPE_SYNC {
            let log_path = self.paths.log_path(name);
            if log_path.exists() {
                if let Err(err) = fs::remove_file(&log_path) {
                    warn!(name, %err, "failed to remove sync log of removed profile");
                }
            }
        }
        true
    }

    /// Renames a sync profile and its log file together. A failing log
    /// rename rolls the profile rename back.
    #[must_use]
    pub fn rename(&self, name: &str, new_name: &str) -> bool {
        let source = self.paths.primary_profile_path(name, TYPE_SYNC);
        let destination = self.paths.primary_profile_path(new_name, TYPE_SYNC);
        if let Err(err) = fs::rename(&source, &destination) {
            let failure = StoreError::RenameFailure {
                from: source.clone(),
                to: destination.clone(),
            };
            warn!(%failure, %err, "failed to rename profile");
            return false;
        }

        let source_log = self.paths.log_path(name);
        let destination_log = self.paths.log_path(new_name);
        if let Err(err) = fs::rename(&source_log, &destination_log) {
            warn!(name, %err, "failed to rename sync log, rolling back");
            if let Err(err) = fs::rename(&destination, &source) {
                warn!(name, %err, "rollback of profile rename failed");
            }
            return false;
        }
        true
    }

    /// Parses and persists a caller-supplied profile document. Returns the
    /// profile name, or an empty string when the document does not parse.
    #[must_use]
    pub fn add_profile(&self, profile_xml: &str) -> String {
        if profile_xml.is_empty() {
            return String::new();
        }
        match factory::profile_from_document(profile_xml) {
            Ok(profile) => {
                let _ = self.save(&profile);
                profile.name().to_string()
            }
            Err(err) => {
                warn!(%err, "rejecting unparsable profile document");
                String::new()
            }
        }
    }

    /// Switches a sync profile to scheduled sync with the given schedule
    /// fragment and persists it.
    #[must_use]
    pub fn set_sync_schedule(&self, profile_id: &str, schedule_xml: &str) -> bool {
        let Some(mut profile) = self.sync_profile(profile_id) else {
            warn!(profile = profile_id, "cannot schedule an unknown profile");
            return false;
        };
        let element = match xml::parse_document(schedule_xml) {
            Ok(element) => element,
            Err(err) => {
                warn!(profile = profile_id, %err, "rejecting unparsable schedule");
                return false;
            }
        };
        profile.set_sync_type(SyncType::Scheduled);
        profile.set_schedule(SyncSchedule::from_element(&element));
        self.save(&profile)
    }

    /// Appends one run's results to the profile's log, creating the log on
    /// first use.
    #[must_use]
    pub fn save_sync_results(&self, profile_name: &str, results: SyncResults) -> bool {
        let mut log = logstore::load_log(&self.paths, profile_name)
            .unwrap_or_else(|| SyncLog::new(profile_name));
        log.add_results(results);
        match logstore::save_log(&self.paths, &log) {
            Ok(()) => true,
            Err(err) => {
                warn!(profile = profile_name, %err, "failed to save sync results");
                false
            }
        }
    }

    #[must_use]
    pub fn load_log(&self, profile_name: &str) -> Option<SyncLog> {
        logstore::load_log(&self.paths, profile_name)
    }

    #[must_use]
    pub fn save_log(&self, log: &SyncLog) -> bool {
        match logstore::save_log(&self.paths, log) {
            Ok(()) => true,
            Err(err) => {
                warn!(profile = log.profile_name(), %err, "failed to save sync log");
                false
            }
        }
    }

    /// Flips the enabled flag of the named storage sub-profiles in place.
    /// Storages the profile does not carry are logged and skipped; the
    /// caller persists the profile.
    pub fn enable_storages(&self, profile: &mut Profile, storages: &BTreeMap<String, bool>) {
        for (storage, enabled) in storages {
            match profile.sub_profile_mut(storage, TYPE_STORAGE) {
                Some(sub) => sub.set_enabled(*enabled),
                None => warn!(storage = %storage, "no storage sub-profile with that name"),
            }
        }
    }

    /// Records the remote-side identifier of the sync partner and persists
    /// the profile.
    pub fn save_remote_target_id(&self, profile: &mut Profile, target_id: &str) {
        debug!(profile = profile.name(), target_id, "saving remote target id");
        profile.set_key(KEY_REMOTE_ID, target_id);
        let _ = self.save(profile);
    }

    /// Builds a transient sync profile for a freshly discovered device.
    /// The returned flag tells the caller whether the profile should be
    /// persisted: USB destinations and computer-class devices sync ad hoc,
    /// anything else gets a clone of the Bluetooth template profile.
    #[must_use]
    pub fn create_temp_sync_profile(
        &self,
        dest_address: &str,
        oracle: &dyn DeviceOracle,
    ) -> Option<(Profile, bool)> {
        if dest_address.contains("USB") {
            debug!(dest_address, "usb destination, profile is not persisted");
            return Some((Profile::new(dest_address, TYPE_SYNC), false));
        }

        let properties = match oracle.device_properties(dest_address) {
            Ok(properties) => properties,
            Err(err) => {
                warn!(dest_address, %err, "device property lookup failed");
                Default::default()
            }
        };
        if properties.class & COMPUTER_DEVICE_CLASS != 0 {
            debug!(dest_address, "computer-class device, profile is not persisted");
            return Some((Profile::new(dest_address, TYPE_SYNC), false));
        }

        let display_name = if properties.name.is_empty() {
            DEFAULT_DEVICE_DISPLAY_NAME.to_string()
        } else {
            properties.name
        };

        let Some(mut profile) = self.sync_profile(BT_PROFILE_TEMPLATE) else {
            warn!(template = BT_PROFILE_TEMPLATE, "device template profile is missing");
            return None;
        };
        let Some(service_name) = profile.sub_profile_names(TYPE_SERVICE).first().cloned() else {
            warn!(
                template = BT_PROFILE_TEMPLATE,
                "template has no service sub-profile, unable to set device properties"
            );
            return None;
        };

        profile.set_key(KEY_DISPLAY_NAME, &display_name);
        profile.set_name_parts(&[dest_address, service_name.as_str()]);
        profile.set_enabled(true);
        profile.set_hidden(false);
        if let Some(service) = profile.sub_profile_mut(&service_name, TYPE_SERVICE) {
            service.set_key(KEY_BT_ADDRESS, dest_address);
            service.set_key(KEY_BT_NAME, &display_name);
        }
        Some((profile, true))
    }
}

fn list_profile_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().map(|kind| kind.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(OsStr::to_str)
                != Some(FORMAT_EXT.trim_start_matches('.'))
            {
                return None;
            }
            path.file_stem()
                .and_then(OsStr::to_str)
                .map(ToString::to_string)
        })
        .collect();
    names.sort();
    names
}
