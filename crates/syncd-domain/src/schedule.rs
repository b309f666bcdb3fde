//! Declarative sync schedule, serialized as a `<schedule>` fragment.

use time::format_description;
use time::Time;
use tracing::debug;

use crate::defs::{TAG_RUSH, TAG_SCHEDULE};
use crate::xml::Element;

/// Faster cadence during configured rush hours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RushHours {
    /// ISO weekday numbers, 1 = Monday .. 7 = Sunday.
    pub days: Vec<u8>,
    pub begin: Option<Time>,
    pub end: Option<Time>,
    pub interval_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSchedule {
    pub enabled: bool,
    pub days: Vec<u8>,
    pub begin: Option<Time>,
    pub end: Option<Time>,
    pub interval_minutes: u32,
    pub rush: Option<RushHours>,
}

impl SyncSchedule {
    /// Builds a schedule from a `<schedule>` element. Parsing is lenient:
    /// unparsable attributes fall back to the defaults so a hand-edited
    /// schedule never blocks loading the enclosing profile.
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        let mut schedule = Self {
            enabled: element.attr("enabled") == Some("true"),
            days: parse_days(element.attr("days").unwrap_or("")),
            begin: parse_time(element.attr("begin")),
            end: parse_time(element.attr("end")),
            interval_minutes: parse_interval(element.attr("interval")),
            rush: None,
        };
        if let Some(rush) = element.first_child(TAG_RUSH) {
            schedule.rush = Some(RushHours {
                days: parse_days(rush.attr("days").unwrap_or("")),
                begin: parse_time(rush.attr("begin")),
                end: parse_time(rush.attr("end")),
                interval_minutes: parse_interval(rush.attr("interval")),
            });
        }
        schedule
    }

    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(TAG_SCHEDULE);
        element.set_attr("enabled", if self.enabled { "true" } else { "false" });
        element.set_attr("interval", &self.interval_minutes.to_string());
        if !self.days.is_empty() {
            element.set_attr("days", &format_days(&self.days));
        }
        if let Some(begin) = self.begin {
            element.set_attr("begin", &format_time(begin));
        }
        if let Some(end) = self.end {
            element.set_attr("end", &format_time(end));
        }
        if let Some(rush) = &self.rush {
            let mut child = Element::new(TAG_RUSH);
            if !rush.days.is_empty() {
                child.set_attr("days", &format_days(&rush.days));
            }
            if let Some(begin) = rush.begin {
                child.set_attr("begin", &format_time(begin));
            }
            if let Some(end) = rush.end {
                child.set_attr("end", &format_time(end));
            }
            child.set_attr("interval", &rush.interval_minutes.to_string());
            element.push_child(child);
        }
        element
    }
}

const TIME_FORMAT: &str = "[hour]:[minute]";

fn parse_time(raw: Option<&str>) -> Option<Time> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let fmt = format_description::parse(TIME_FORMAT).ok()?;
    match Time::parse(raw, &fmt) {
        Ok(time) => Some(time),
        Err(err) => {
            debug!(raw, %err, "ignoring unparsable schedule time");
            None
        }
    }
}

fn format_time(time: Time) -> String {
    format_description::parse(TIME_FORMAT)
        .ok()
        .and_then(|fmt| time.format(&fmt).ok())
        .unwrap_or_default()
}

fn parse_days(raw: &str) -> Vec<u8> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u8>().ok())
        .filter(|day| (1..=7).contains(day))
        .collect()
}

fn format_days(days: &[u8]) -> String {
    days.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_interval(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}
