//! Reserved names of the profile XML dialect.

pub const TYPE_SYNC: &str = "sync";
pub const TYPE_SERVICE: &str = "service";
pub const TYPE_STORAGE: &str = "storage";
pub const TYPE_CLIENT: &str = "client";
pub const TYPE_SERVER: &str = "server";

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_HIDDEN: &str = "hidden";
pub const KEY_PROTECTED: &str = "protected";
pub const KEY_DISPLAY_NAME: &str = "displayName";
pub const KEY_REMOTE_ID: &str = "remoteId";
pub const KEY_DESTINATION_TYPE: &str = "destinationType";
pub const KEY_BT_ADDRESS: &str = "btAddress";
pub const KEY_BT_NAME: &str = "btName";

pub const VALUE_ONLINE: &str = "online";
pub const BOOLEAN_TRUE: &str = "true";
pub const BOOLEAN_FALSE: &str = "false";

pub const TAG_PROFILE: &str = "profile";
pub const TAG_KEY: &str = "key";
pub const TAG_FIELD: &str = "field";
pub const TAG_OPTION: &str = "option";
pub const TAG_SCHEDULE: &str = "schedule";
pub const TAG_RUSH: &str = "rush";
pub const TAG_SYNC_LOG: &str = "syncLog";
pub const TAG_SYNC_RESULTS: &str = "syncResults";
pub const TAG_TARGET: &str = "target";
pub const TAG_ERROR: &str = "error";

pub const ATTR_NAME: &str = "name";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_VALUE: &str = "value";

/// Indent width used when serializing profile and log documents.
pub const PROFILE_INDENT: usize = 4;

/// Separator joining the segments of a compound profile name.
pub const NAME_SEPARATOR: char = '|';
