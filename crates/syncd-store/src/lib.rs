#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod codec;
mod error;
mod expand;
mod loader;
mod logstore;
mod manager;
mod oracle;
mod paths;
mod search;

pub use error::StoreError;
pub use manager::{ProfileManager, BT_PROFILE_TEMPLATE, DEFAULT_DEVICE_DISPLAY_NAME};
pub use oracle::{DeviceOracle, DeviceProperties, COMPUTER_DEVICE_CLASS};
pub use paths::ProfilePaths;
pub use search::{match_key, match_profile};
