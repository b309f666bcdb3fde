#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod criteria;
pub mod defs;
pub mod factory;
pub mod log;
pub mod profile;
pub mod schedule;
pub mod xml;

pub use criteria::{MatchType, SearchCriteria};
pub use factory::{profile_from_document, profile_from_element};
pub use log::{SyncLog, SyncResults, TargetResults};
pub use profile::{FieldSpec, Profile, SyncExtras, SyncType};
pub use schedule::{RushHours, SyncSchedule};
