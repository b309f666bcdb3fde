//! Builds typed profiles from XML elements.

use anyhow::{anyhow, Result};

use crate::defs::{ATTR_NAME, ATTR_TYPE, ATTR_VALUE, TAG_FIELD, TAG_KEY, TAG_OPTION, TAG_PROFILE, TAG_SCHEDULE};
use crate::profile::{FieldSpec, Profile, SyncType};
use crate::schedule::SyncSchedule;
use crate::xml::{self, Element};

/// Builds a profile from a `<profile>` element. A `type="sync"` element
/// produces a profile carrying the sync extras block; any other type
/// produces a plain profile. Sub-profile elements are parsed recursively
/// and left unloaded for the expander.
///
/// # Errors
///
/// Returns an error when the element is not a `<profile>` or lacks a
/// non-empty `name` or `type` attribute.
pub fn profile_from_element(element: &Element) -> Result<Profile> {
    if element.tag() != TAG_PROFILE {
        return Err(anyhow!("unexpected profile element <{}>", element.tag()));
    }
    let name = element
        .attr(ATTR_NAME)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("profile element is missing the name attribute"))?;
    let profile_type = element
        .attr(ATTR_TYPE)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("profile {name} is missing the type attribute"))?;

    let mut profile = Profile::new(name, profile_type);
    for child in element.children() {
        match child.tag() {
            TAG_KEY => {
                if let Some(key) = child.attr(ATTR_NAME) {
                    profile.set_key(key, child.attr(ATTR_VALUE).unwrap_or(""));
                }
            }
            TAG_FIELD => {
                if let Some(field) = child.attr(ATTR_NAME) {
                    profile.set_field(field, field_spec_from_element(child));
                }
            }
            TAG_SCHEDULE => {
                if profile.is_sync() {
                    profile.set_sync_type(SyncType::Scheduled);
                    profile.set_schedule(SyncSchedule::from_element(child));
                }
            }
            TAG_PROFILE => {
                profile.add_sub_profile(profile_from_element(child)?);
            }
            _ => {}
        }
    }
    Ok(profile)
}

/// Parses a whole document and builds the profile from its root element.
///
/// # Errors
///
/// Returns an error when the text is not well-formed XML or the root is not
/// a valid profile element.
pub fn profile_from_document(raw: &str) -> Result<Profile> {
    let root = xml::parse_document(raw)?;
    profile_from_element(&root)
}

fn field_spec_from_element(element: &Element) -> FieldSpec {
    FieldSpec {
        field_type: element.attr(ATTR_TYPE).unwrap_or("").to_string(),
        default: element.attr("default").unwrap_or("").to_string(),
        options: element
            .children_with_tag(TAG_OPTION)
            .filter_map(|option| option.attr(ATTR_VALUE))
            .map(ToString::to_string)
            .collect(),
    }
}
