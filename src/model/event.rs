use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::description::{self, clean_line};

/// Free text dates as they appear in the feed, tried in order before falling back to fuzzy parsing
const DATE_FORMATS: [&str; 5] = ["%B %d, %Y", "%B %d %Y", "%Y-%m-%d", "%m/%d/%Y", "%d %B %Y"];

/// Month names, full or abbreviated, optionally followed by a dot ("Sept.", "Dec", "March")
static MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?").unwrap()
});

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s*m\b").unwrap());

/// One entry of the feed as received, before any interpretation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEventItem {
    pub title: String,
    /// Free text, possibly containing HTML markup
    pub body: String,
    pub link: String,
}

impl RawEventItem {
    /// Parses the body and normalizes the result
    ///
    /// Items without a title are dropped here and never reach the display.
    pub fn normalize(&self, tz: &Tz) -> Option<NormalizedEvent> {
        let title = clean_line(&self.title);
        if title.is_empty() {
            debug!("dropping feed item without a title: {:?}", self.link);
            return None;
        }

        let fields = description::parse(&self.body);
        debug!("parsed fields for {:?}: {:?}", title, fields);

        let mut event = normalize(
            &title,
            &fields.date_start,
            &fields.date_end,
            &fields.time,
            &fields.location,
            tz,
        );
        event.link = clean_line(&self.link);
        Some(event)
    }
}

/// A typed event record
///
/// `start` is `None` when the feed date could not be understood, such events never enter the window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: String,
    pub link: String,
    /// The feed gave a day but no clock time, `start` is only the local midnight of that day
    pub all_day: bool,
    /// The time description as written in the feed, e.g. "All Day"
    pub time_text: String,
}

impl fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "UNKNOWN".to_string())
        };
        write!(
            f,
            "{} ({} to {}) at {}",
            self.title,
            when(self.start),
            when(self.end),
            if self.location.is_empty() {
                "NO LOCATION"
            } else {
                self.location.as_str()
            }
        )
    }
}

impl NormalizedEvent {
    /// The end to show on the display
    ///
    /// An end missing or within `tolerance` of the start collapses to a single time.
    pub fn display_end(&self, tolerance: Duration) -> Option<DateTime<Utc>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end > start + tolerance => Some(end),
            _ => None,
        }
    }
}

/// A date as read from the feed: either an exact instant or a calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FeedDate {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

/// Builds a typed event from the strings extracted from a feed item
///
/// Dates in ISO-8601 form are exact, anything else is read as a calendar day in `tz` and
/// combined with the times found in `time`. Unreadable dates leave the timestamp empty.
pub fn normalize(
    title: &str,
    date_start: &str,
    date_end: &str,
    time: &str,
    location: &str,
    tz: &Tz,
) -> NormalizedEvent {
    let start_date = parse_feed_date(date_start);
    let end_date = parse_feed_date(date_end);
    let (start_time, end_time) = parse_time_range(time);
    let all_day = matches!(start_date, Some(FeedDate::Day(_))) && start_time.is_none();

    let start_local = match start_date {
        Some(FeedDate::Day(day)) => Some(day.and_time(start_time.unwrap_or(NaiveTime::MIN))),
        _ => None,
    };

    let start = match start_date {
        Some(FeedDate::Instant(instant)) => Some(instant),
        Some(FeedDate::Day(_)) => start_local.and_then(|local| localize(local, tz)),
        None => {
            if !date_start.is_empty() {
                debug!("could not parse start date {:?} of {:?}", date_start, title);
            }
            None
        }
    };

    let end = match end_date {
        Some(FeedDate::Instant(instant)) => Some(instant),
        Some(FeedDate::Day(day)) => localize(day.and_time(end_time.unwrap_or(end_of_day())), tz),
        None => match (start_local, end_time) {
            (Some(start_local), Some(end_time)) => {
                let mut end_local = start_local.date().and_time(end_time);
                // an end earlier than the start on the same day runs past midnight
                if end_local < start_local {
                    end_local += Duration::days(1);
                }
                localize(end_local, tz)
            }
            _ => None,
        },
    };

    NormalizedEvent {
        title: title.trim().to_string(),
        start,
        end,
        location: clean_line(location),
        link: String::new(),
        all_day,
        time_text: clean_line(time),
    }
}

fn parse_feed_date(s: &str) -> Option<FeedDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(FeedDate::Instant(instant.with_timezone(&Utc)));
    }

    // chrono reads "Sep" and "September" but not "Sept" or "Sep."
    let month_fixed = MONTH_NAME.replace_all(s, "${1}");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&month_fixed, fmt).ok())
        .or_else(|| fuzzydate::parse(s).ok().map(|d| d.date()))
        .map(FeedDate::Day)
}

/// Finds up to two clock times such as "6:00 PM" or "7pm" in a free text time description
pub fn parse_time_range(s: &str) -> (Option<NaiveTime>, Option<NaiveTime>) {
    let mut times = CLOCK_TIME.captures_iter(s).filter_map(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse())
            .transpose()
            .ok()?
            .unwrap_or(0);
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
        NaiveTime::from_hms_opt(hour % 12 + if pm { 12 } else { 0 }, minute, 0)
    });
    (times.next(), times.next())
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Pins a wall clock time to `tz`, taking the earlier instant when the clock is ambiguous
pub(crate) fn localize(local: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::None => {
            debug!("no sensible time for {} in {}", local, tz.name());
            None
        }
        LocalResult::Single(time) => Some(time.with_timezone(&Utc)),
        LocalResult::Ambiguous(time, _second_time) => Some(time.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Chicago;
    use pretty_assertions::assert_eq;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn free_text_date_and_time_range() {
        let event = normalize(
            "Concert in the Park",
            "August 6, 2025",
            "",
            "6:00 PM - 8:00 PM",
            "Village  Park",
            &Chicago,
        );
        assert_eq!(event.start, Some(utc("2025-08-06T18:00:00-05:00")));
        assert_eq!(event.end, Some(utc("2025-08-06T20:00:00-05:00")));
        assert_eq!(event.location, "Village Park");
    }

    #[test]
    fn date_range_without_end_time_runs_to_end_of_day() {
        let event = normalize(
            "Fair",
            "August 4, 2025",
            "August 10, 2025",
            "5:00 PM",
            "",
            &Chicago,
        );
        assert_eq!(event.start, Some(utc("2025-08-04T17:00:00-05:00")));
        assert_eq!(event.end, Some(utc("2025-08-10T23:59:59-05:00")));
    }

    #[test]
    fn missing_time_starts_at_midnight_without_end() {
        let event = normalize("Cleanup Day", "April 18, 2026", "", "", "", &Chicago);
        assert_eq!(event.start, Some(utc("2026-04-18T00:00:00-05:00")));
        assert_eq!(event.end, None);
        assert!(event.all_day);
        assert_eq!(event.time_text, "");
    }

    #[test]
    fn time_without_clock_values_is_kept_as_text() {
        let event = normalize("Library Sale", "January 5, 2026", "", " All  Day ", "", &Chicago);
        assert_eq!(event.start, Some(utc("2026-01-05T00:00:00-06:00")));
        assert!(event.all_day);
        assert_eq!(event.time_text, "All Day");

        let timed = normalize("Bingo", "January 5, 2026", "", "6:00 PM", "", &Chicago);
        assert!(!timed.all_day);

        let exact = normalize("Meeting", "2026-01-05T18:00:00Z", "", "", "", &Chicago);
        assert!(!exact.all_day);
    }

    #[test]
    fn abbreviated_month_names() {
        let day = |s: &str| normalize("x", s, "", "", "", &Chicago).start;
        let sept_fifth = Some(utc("2026-09-05T00:00:00-05:00"));
        assert_eq!(day("Sept 5, 2026"), sept_fifth);
        assert_eq!(day("Sept. 5, 2026"), sept_fifth);
        assert_eq!(day("SEPT 5 2026"), sept_fifth);
        assert_eq!(day("Sep 5, 2026"), sept_fifth);
        assert_eq!(day("September 5, 2026"), sept_fifth);
        assert_eq!(day("Dec. 24, 2026"), Some(utc("2026-12-24T00:00:00-06:00")));
    }

    #[test]
    fn overnight_end_rolls_to_next_day() {
        let event = normalize("Lock-in", "January 9, 2026", "", "9 PM - 1 AM", "", &Chicago);
        assert_eq!(event.start, Some(utc("2026-01-09T21:00:00-06:00")));
        assert_eq!(event.end, Some(utc("2026-01-10T01:00:00-06:00")));
    }

    #[test]
    fn iso_timestamps_are_exact() {
        let event = normalize(
            "Board Meeting",
            "2026-01-09T23:00:00Z",
            "2026-01-10T01:00:00+00:00",
            "ignored 3 PM",
            "Hall",
            &Chicago,
        );
        assert_eq!(event.start, Some(utc("2026-01-09T23:00:00Z")));
        assert_eq!(event.end, Some(utc("2026-01-10T01:00:00Z")));
    }

    #[test]
    fn unparsable_dates_are_absent_not_errors() {
        let event = normalize("Mystery", "TBD", "", "", "", &Chicago);
        assert_eq!(event.start, None);
        assert_eq!(event.end, None);
        assert_eq!(event.title, "Mystery");
    }

    #[test]
    fn time_range_parsing() {
        assert_eq!(parse_time_range("6:00 PM - 8:00 PM"), (Some(hm(18, 0)), Some(hm(20, 0))));
        assert_eq!(parse_time_range("7pm"), (Some(hm(19, 0)), None));
        assert_eq!(parse_time_range("12:30 a.m. to 12 p.m."), (Some(hm(0, 30)), Some(hm(12, 0))));
        assert_eq!(parse_time_range("All Day"), (None, None));
        assert_eq!(parse_time_range(""), (None, None));
    }

    #[test]
    fn same_instant_collapse() {
        let start = utc("2026-01-09T18:00:00Z");
        let mut event = NormalizedEvent {
            title: "Tree Lighting".into(),
            start: Some(start),
            end: Some(utc("2026-01-09T18:00:30Z")),
            ..NormalizedEvent::default()
        };
        assert_eq!(event.display_end(Duration::seconds(60)), None);

        event.end = Some(utc("2026-01-09T18:05:00Z"));
        assert_eq!(event.display_end(Duration::seconds(60)), event.end);

        event.end = None;
        assert_eq!(event.display_end(Duration::seconds(60)), None);
    }

    #[test]
    fn raw_items_without_title_are_dropped() {
        let item = RawEventItem {
            title: "   ".into(),
            body: "Event date: May 1, 2026".into(),
            link: "https://example.com/1".into(),
        };
        assert_eq!(item.normalize(&Chicago), None);
    }

    #[test]
    fn raw_items_flow_through_the_parser() {
        let item = RawEventItem {
            title: " Farmers\n Market ".into(),
            body: "Event date: May 1, 2026<br>Event Time: 8:00 AM - 1:00 PM<br>Location: Town Center"
                .into(),
            link: " https://example.com/market ".into(),
        };
        let event = item.normalize(&Chicago).unwrap();
        assert_eq!(event.title, "Farmers Market");
        assert_eq!(event.start, Some(utc("2026-05-01T08:00:00-05:00")));
        assert_eq!(event.end, Some(utc("2026-05-01T13:00:00-05:00")));
        assert_eq!(event.location, "Town Center");
        assert_eq!(event.link, "https://example.com/market");
    }
}
