//! Per-profile sync log: an append-only history of sync runs.

use anyhow::{anyhow, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::defs::{ATTR_NAME, TAG_ERROR, TAG_SYNC_LOG, TAG_SYNC_RESULTS, TAG_TARGET};
use crate::xml::Element;

/// Per-target item counts of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetResults {
    pub target: String,
    pub items_added: u32,
    pub items_deleted: u32,
    pub items_modified: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncResults {
    pub timestamp: OffsetDateTime,
    /// Major status code of the run; 0 means success.
    pub major_code: u32,
    /// True when the run was started by the scheduler rather than a user.
    pub scheduled: bool,
    pub targets: Vec<TargetResults>,
    pub error: Option<String>,
}

impl SyncResults {
    #[must_use]
    pub fn new(timestamp: OffsetDateTime, major_code: u32, scheduled: bool) -> Self {
        Self {
            timestamp,
            major_code,
            scheduled,
            targets: Vec::new(),
            error: None,
        }
    }

    fn from_element(element: &Element) -> Self {
        let timestamp = element
            .attr("time")
            .and_then(|raw| match OffsetDateTime::parse(raw, &Rfc3339) {
                Ok(timestamp) => Some(timestamp),
                Err(err) => {
                    debug!(raw, %err, "unparsable sync result timestamp");
                    None
                }
            })
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let major_code = element
            .attr("majorCode")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let scheduled = element.attr("scheduled") == Some("true");
        let targets = element
            .children_with_tag(TAG_TARGET)
            .map(|target| TargetResults {
                target: target.attr(ATTR_NAME).unwrap_or("").to_string(),
                items_added: parse_count(target.attr("added")),
                items_deleted: parse_count(target.attr("deleted")),
                items_modified: parse_count(target.attr("modified")),
            })
            .collect();
        let error = element
            .first_child(TAG_ERROR)
            .map(|child| child.text().to_string())
            .filter(|text| !text.is_empty());
        Self {
            timestamp,
            major_code,
            scheduled,
            targets,
            error,
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(TAG_SYNC_RESULTS);
        let time = self
            .timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::new());
        element.set_attr("time", &time);
        element.set_attr("majorCode", &self.major_code.to_string());
        element.set_attr("scheduled", if self.scheduled { "true" } else { "false" });
        for target in &self.targets {
            let mut child = Element::new(TAG_TARGET);
            child.set_attr(ATTR_NAME, &target.target);
            child.set_attr("added", &target.items_added.to_string());
            child.set_attr("deleted", &target.items_deleted.to_string());
            child.set_attr("modified", &target.items_modified.to_string());
            element.push_child(child);
        }
        if let Some(error) = &self.error {
            let mut child = Element::new(TAG_ERROR);
            child.set_text(error);
            element.push_child(child);
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncLog {
    profile_name: String,
    results: Vec<SyncResults>,
}

impl SyncLog {
    #[must_use]
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    #[must_use]
    pub fn results(&self) -> &[SyncResults] {
        &self.results
    }

    #[must_use]
    pub fn last_results(&self) -> Option<&SyncResults> {
        self.results.last()
    }

    /// Appends one run; results stay in append (chronological) order.
    pub fn add_results(&mut self, results: SyncResults) {
        self.results.push(results);
    }

    /// Builds a log from a `<syncLog>` root element.
    ///
    /// # Errors
    ///
    /// Returns an error when the root element is not a `<syncLog>` carrying
    /// a profile name.
    pub fn from_element(element: &Element) -> Result<Self> {
        if element.tag() != TAG_SYNC_LOG {
            return Err(anyhow!("unexpected log root element <{}>", element.tag()));
        }
        let profile_name = element
            .attr("profile")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("sync log is missing the profile attribute"))?;
        let results = element
            .children_with_tag(TAG_SYNC_RESULTS)
            .map(SyncResults::from_element)
            .collect();
        Ok(Self {
            profile_name: profile_name.to_string(),
            results,
        })
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(TAG_SYNC_LOG);
        element.set_attr("profile", &self.profile_name);
        for results in &self.results {
            element.push_child(results.to_element());
        }
        element
    }
}

fn parse_count(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(0)
}
