//! Search predicates over profile trees.

/// How a key value is compared during a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchType {
    #[default]
    Equal,
    NotEqual,
    Exists,
    NotExists,
}

/// One predicate of a multi-criterion profile query. Criteria in a list are
/// combined with logical AND. Empty strings mean "not set", mirroring the
/// facade's string-based call surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub match_type: MatchType,
    /// When set, the key test runs against the sub-profile with this name
    /// (and `sub_profile_type`, when that is set too).
    pub sub_profile_name: String,
    /// When set without a name, the key test runs against every sub-profile
    /// of this type and any match suffices.
    pub sub_profile_type: String,
    pub key: String,
    pub value: String,
}

impl SearchCriteria {
    #[must_use]
    pub fn new(match_type: MatchType) -> Self {
        Self {
            match_type,
            ..Self::default()
        }
    }
}
