use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use log::debug;
use serde::{Deserialize, Serialize};

use super::description::clean_line;
use super::event::{normalize, NormalizedEvent};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// One record of the persisted event snapshot
///
/// `start` is left out for events whose date could not be read when the snapshot was written.
/// Events the feed gave no clock time for keep plain `YYYY-MM-DD` dates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SnapshotEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SnapshotEvent {
    pub fn new(event: &NormalizedEvent, tz: &Tz) -> Self {
        let stamp = |t: DateTime<Utc>| {
            if event.all_day {
                t.with_timezone(tz).format(DAY_FORMAT).to_string()
            } else {
                t.to_rfc3339_opts(SecondsFormat::Secs, true)
            }
        };
        SnapshotEvent {
            title: event.title.clone(),
            start: event.start.map(stamp),
            end: event.end.map(stamp),
            time: Some(event.time_text.clone()).filter(|t| !t.is_empty()),
            location: event.location.clone(),
            link: Some(event.link.clone()).filter(|l| !l.is_empty()),
        }
    }

    /// Reads the record back into a typed event, timestamps are parsed exactly
    pub fn normalize(&self, tz: &Tz) -> Option<NormalizedEvent> {
        let title = clean_line(&self.title);
        if title.is_empty() {
            debug!("dropping snapshot record without a title");
            return None;
        }

        let mut event = normalize(
            &title,
            self.start.as_deref().unwrap_or_default(),
            self.end.as_deref().unwrap_or_default(),
            self.time.as_deref().unwrap_or_default(),
            &self.location,
            tz,
        );
        event.link = self.link.clone().unwrap_or_default();
        Some(event)
    }
}
