//! Criterion evaluation for profile queries.

use syncd_domain::{MatchType, Profile, SearchCriteria};

/// Evaluates one criterion against a profile. Criteria lists are combined
/// with AND by the caller.
#[must_use]
pub fn match_profile(profile: &Profile, criteria: &SearchCriteria) -> bool {
    if !criteria.sub_profile_name.is_empty() {
        // A sub-profile name was given: the key test runs against the
        // sub-profile with that name and type.
        return match profile.sub_profile(&criteria.sub_profile_name, &criteria.sub_profile_type) {
            Some(sub) => match_key(sub, criteria),
            None => criteria.match_type == MatchType::NotExists,
        };
    }

    if !criteria.sub_profile_type.is_empty() {
        // Only a type was given: any sub-profile of that type may satisfy
        // the key test.
        let names = profile.sub_profile_names(&criteria.sub_profile_type);
        if names.is_empty() {
            return criteria.match_type == MatchType::NotExists;
        }
        return names.iter().any(|name| {
            profile
                .sub_profile(name, &criteria.sub_profile_type)
                .is_some_and(|sub| match_key(sub, criteria))
        });
    }

    match_key(profile, criteria)
}

/// The key test of a criterion, against the profile it reduced to.
#[must_use]
pub fn match_key(profile: &Profile, criteria: &SearchCriteria) -> bool {
    if criteria.key.is_empty() {
        return criteria.match_type != MatchType::NotExists;
    }
    match profile.key(&criteria.key) {
        None => matches!(
            criteria.match_type,
            MatchType::NotExists | MatchType::NotEqual
        ),
        Some(value) => match criteria.match_type {
            MatchType::Exists => true,
            MatchType::NotExists => false,
            MatchType::Equal => value == criteria.value,
            MatchType::NotEqual => value != criteria.value,
        },
    }
}
