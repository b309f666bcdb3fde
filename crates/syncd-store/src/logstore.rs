//! Sync log persistence under `<primary>/sync/logs/`.

use std::fs;

use tracing::{debug, warn};

use syncd_domain::SyncLog;

use crate::codec;
use crate::error::StoreError;
use crate::paths::ProfilePaths;

pub(crate) fn load_log(paths: &ProfilePaths, profile_name: &str) -> Option<SyncLog> {
    let path = paths.log_path(profile_name);
    if !path.exists() {
        debug!(profile = profile_name, "no sync log for profile");
        return None;
    }
    match codec::read_document(&path) {
        Ok(doc) => match SyncLog::from_element(&doc) {
            Ok(log) => Some(log),
            Err(err) => {
                warn!(profile = profile_name, %err, "failed to read sync log");
                None
            }
        },
        Err(err) => {
            warn!(profile = profile_name, %err, "failed to read sync log");
            None
        }
    }
}

pub(crate) fn save_log(paths: &ProfilePaths, log: &SyncLog) -> Result<(), StoreError> {
    let dir = paths.log_dir();
    fs::create_dir_all(&dir).map_err(|source| StoreError::io(&dir, source))?;
    codec::write_document(&paths.log_path(log.profile_name()), &log.to_element())
}
