use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use color_eyre::eyre::Result;
use serde::Serialize;

use crate::configuration::config::Config;
use crate::model::event::NormalizedEvent;
use crate::model::pages::Page;

/// Separates the start and end of a date or time range
const RANGE_SEPARATOR: &str = " – ";

/// Receives the pages to put on screen
///
/// Titles and locations in the contexts are raw text, a renderer producing markup must escape them.
pub trait Renderer {
    /// Puts a page on screen right away, used after a refresh
    fn show(&mut self, page: &PageContext) -> Result<()>;

    fn fade_out(&mut self, index: usize) -> Result<()>;

    /// Prepares the next page while it is still invisible
    fn render_hidden(&mut self, page: &PageContext) -> Result<()>;

    fn fade_in(&mut self, index: usize) -> Result<()>;

    /// Shows nothing, there are no events to rotate
    fn clear(&mut self) -> Result<()>;
}

/// How events are turned into display strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFormat {
    pub timezone: Tz,
    pub date_format: String,
    pub time_format: String,
    pub same_instant: Duration,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        DisplayFormat::from(&Config::default())
    }
}

impl From<&Config> for DisplayFormat {
    fn from(config: &Config) -> Self {
        DisplayFormat {
            timezone: config.display_timezone.timezone(),
            date_format: config.event_date_format.clone(),
            time_format: config.event_time_format.clone(),
            same_instant: Duration::seconds(config.same_instant_seconds),
        }
    }
}

impl DisplayFormat {
    fn date(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.timezone)
            .format(&self.date_format)
            .to_string()
    }

    fn time(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.timezone)
            .format(&self.time_format)
            .to_string()
    }

    /// Whether the end falls on a later local day and the event is more than an overnight stay
    fn spans_days(&self, event: &NormalizedEvent, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let later_day = end.with_timezone(&self.timezone).date_naive()
            > start.with_timezone(&self.timezone).date_naive();
        later_day && (event.all_day || end - start >= Duration::days(1))
    }

    /// An end at 23:59:59 local stands for "until the end of the day", not a clock time
    fn is_end_of_day(&self, t: DateTime<Utc>) -> bool {
        let local = t.with_timezone(&self.timezone);
        (local.hour(), local.minute(), local.second()) == (23, 59, 59)
    }
}

/// The values a renderer needs for one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventContext {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub link: String,
    pub start_timestamp: Option<i64>,
}

impl EventContext {
    /// Formats the date and time the way the feed gave them
    ///
    /// Events without a clock time show the feed's own time text, which may be empty. Events
    /// spanning several days show a date range.
    pub fn new(event: &NormalizedEvent, format: &DisplayFormat) -> Self {
        let multi_day = match (event.start, event.end) {
            (Some(start), Some(end)) => format.spans_days(event, start, end),
            _ => false,
        };

        let date = match (event.start, event.end) {
            (Some(start), Some(end)) if multi_day => format!(
                "{}{}{}",
                format.date(start),
                RANGE_SEPARATOR,
                format.date(end)
            ),
            (Some(start), _) => format.date(start),
            (None, _) => String::new(),
        };

        let time = match (event.start, event.display_end(format.same_instant)) {
            _ if event.all_day => event.time_text.clone(),
            (Some(start), Some(end)) if !(multi_day && format.is_end_of_day(end)) => format!(
                "{}{}{}",
                format.time(start),
                RANGE_SEPARATOR,
                format.time(end)
            ),
            (Some(start), _) => format.time(start),
            (None, _) => String::new(),
        };

        EventContext {
            title: event.title.clone(),
            date,
            time,
            location: event.location.clone(),
            link: event.link.clone(),
            start_timestamp: event.start.map(|s| s.timestamp()),
        }
    }
}

/// An immutable snapshot of one page, handed to the renderer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub index: usize,
    pub page_number: usize,
    pub page_count: usize,
    pub visible: bool,
    pub events: Vec<EventContext>,
}

impl PageContext {
    pub fn new(page: &Page, page_count: usize, format: &DisplayFormat) -> Self {
        PageContext {
            index: page.index,
            page_number: page.index + 1,
            page_count,
            visible: true,
            events: page
                .items
                .iter()
                .map(|e| EventContext::new(e, format))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        PageContext {
            index: 0,
            page_number: 0,
            page_count: 0,
            visible: true,
            events: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::normalize;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use pretty_assertions::assert_eq;

    fn chicago(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(2026, 1, 9, h, m, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn event(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> NormalizedEvent {
        NormalizedEvent {
            title: "Fish & Chips <Fundraiser>".into(),
            start: Some(start),
            end,
            location: "VFW Hall".into(),
            link: String::new(),
            ..NormalizedEvent::default()
        }
    }

    #[test]
    fn formats_date_and_time_range() {
        let context = EventContext::new(
            &event(chicago(17, 0, 0), Some(chicago(23, 59, 0))),
            &DisplayFormat::default(),
        );
        assert_eq!(context.date, "Fri, Jan 9");
        assert_eq!(context.time, "5:00 PM – 11:59 PM");
        // escaping is left to the renderer
        assert_eq!(context.title, "Fish & Chips <Fundraiser>");
    }

    #[test]
    fn near_identical_end_collapses_to_one_time() {
        let format = DisplayFormat::default();
        let collapsed = EventContext::new(&event(chicago(18, 0, 0), Some(chicago(18, 0, 30))), &format);
        assert_eq!(collapsed.time, "6:00 PM");

        let range = EventContext::new(&event(chicago(18, 0, 0), Some(chicago(18, 5, 0))), &format);
        assert_eq!(range.time, "6:00 PM – 6:05 PM");

        let open = EventContext::new(&event(chicago(18, 0, 0), None), &format);
        assert_eq!(open.time, "6:00 PM");
    }

    #[test]
    fn days_without_clock_times_show_the_feed_text() {
        let format = DisplayFormat::default();
        let all_day = normalize("Library Sale", "January 9, 2026", "", "All Day", "", &Chicago);
        let context = EventContext::new(&all_day, &format);
        assert_eq!(context.date, "Fri, Jan 9");
        assert_eq!(context.time, "All Day");

        let bare = normalize("Cleanup Day", "January 9, 2026", "", "", "", &Chicago);
        let context = EventContext::new(&bare, &format);
        assert_eq!(context.date, "Fri, Jan 9");
        assert_eq!(context.time, "");
    }

    #[test]
    fn multi_day_events_show_a_date_range() {
        let format = DisplayFormat::default();
        let fair = normalize("Craft Fair", "March 1, 2026", "March 3, 2026", "", "", &Chicago);
        let context = EventContext::new(&fair, &format);
        assert_eq!(context.date, "Sun, Mar 1 – Tue, Mar 3");
        assert_eq!(context.time, "");

        let daily = normalize(
            "Carnival",
            "March 1, 2026",
            "March 3, 2026",
            "6:00 PM - 9:00 PM",
            "",
            &Chicago,
        );
        let context = EventContext::new(&daily, &format);
        assert_eq!(context.date, "Sun, Mar 1 – Tue, Mar 3");
        assert_eq!(context.time, "6:00 PM – 9:00 PM");

        let opening = normalize("Art Show", "March 1, 2026", "March 3, 2026", "5:00 PM", "", &Chicago);
        let context = EventContext::new(&opening, &format);
        assert_eq!(context.date, "Sun, Mar 1 – Tue, Mar 3");
        assert_eq!(context.time, "5:00 PM");
    }

    #[test]
    fn overnight_events_keep_a_single_date() {
        let lock_in = normalize("Lock-in", "January 9, 2026", "", "9 PM - 1 AM", "", &Chicago);
        let context = EventContext::new(&lock_in, &DisplayFormat::default());
        assert_eq!(context.date, "Fri, Jan 9");
        assert_eq!(context.time, "9:00 PM – 1:00 AM");
    }

    #[test]
    fn page_context_numbers_pages_from_one() {
        let page = Page {
            index: 2,
            items: vec![event(chicago(9, 0, 0), None)],
        };
        let context = PageContext::new(&page, 3, &DisplayFormat::default());
        assert_eq!(context.page_number, 3);
        assert_eq!(context.page_count, 3);
        assert_eq!(context.events.len(), 1);
        assert!(!context.hidden().visible);
    }
}
