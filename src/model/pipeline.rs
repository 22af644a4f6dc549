use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};

use super::event::NormalizedEvent;
use super::feed_source::FeedItem;
use super::pages::PageCache;
use super::ranking::rank;
use super::snapshot::SnapshotEvent;
use super::window::{is_past_event, WindowedSet};
use crate::configuration::config::Config;

/// The knobs of one pipeline run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    pub timezone: Tz,
    pub horizon_months: u32,
    pub events_max: usize,
    pub events_per_page: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings::from(&Config::default())
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        PipelineSettings {
            timezone: config.display_timezone.timezone(),
            horizon_months: config.horizon_months,
            events_max: config.events_max,
            events_per_page: config.events_per_page,
        }
    }
}

/// Parses and normalizes every feed item, dropping the ones without a title
pub fn normalize_all(items: &[FeedItem], tz: &Tz) -> Vec<NormalizedEvent> {
    let events: Vec<_> = items.iter().filter_map(|item| item.normalize(tz)).collect();
    debug!(
        "normalized {} of {} feed items",
        events.len(),
        items.len()
    );
    events
}

/// Runs the whole display pipeline against a single captured `now`
///
/// The same items and the same `now` always produce the same window and pages.
pub fn run(
    items: &[FeedItem],
    now: DateTime<Utc>,
    settings: &PipelineSettings,
) -> (WindowedSet, PageCache) {
    let events = normalize_all(items, &settings.timezone);
    let windowed = WindowedSet::compute(
        events,
        now,
        settings.horizon_months,
        settings.events_max,
        &settings.timezone,
    );
    let pages = PageCache::new(windowed.events(), settings.events_per_page);
    info!(
        "pipeline kept {} events on {} pages",
        windowed.len(),
        pages.page_count()
    );
    (windowed, pages)
}

/// Builds the persisted snapshot from freshly fetched feed items
///
/// Expired events are dropped, events with unreadable dates are kept. The result is ordered
/// by start with undated events last.
pub fn ingest(items: &[FeedItem], now: DateTime<Utc>, tz: &Tz) -> Vec<SnapshotEvent> {
    let events = normalize_all(items, tz);
    let total = events.len();

    let current: Vec<_> = events
        .into_iter()
        .filter(|event| {
            let past = is_past_event(event, now, tz);
            if past {
                debug!("dropping past event: {}", event);
            } else if event.start.is_none() {
                // TODO: undated events are kept on every ingest, decide whether they should age out
                debug!("keeping event with unreadable date: {}", event.title);
            }
            !past
        })
        .collect();

    info!("ingest kept {} of {} events", current.len(), total);
    rank(current)
        .iter()
        .map(|event| SnapshotEvent::new(event, tz))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::RawEventItem;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use pretty_assertions::assert_eq;

    fn raw(title: &str, body: &str) -> FeedItem {
        FeedItem::Raw(RawEventItem {
            title: title.into(),
            body: body.into(),
            link: String::new(),
        })
    }

    fn now() -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(2026, 1, 9, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn feed() -> Vec<FeedItem> {
        vec![
            raw("Yesterday", "Event date: January 8, 2026<br>Event Time: 6:00 PM"),
            raw("Tonight", "Event date: January 9, 2026<br>Event Time: 6:00 PM - 8:00 PM<br>Location: Hall"),
            raw("", "Event date: January 10, 2026"),
            raw("No Date", "Location: Somewhere"),
            raw("Summer", "Event date: July 4, 2026"),
            raw("Spring", "Event date: March 1, 2026<br>Event Time: 10:00 AM"),
            raw("Earlier Today", "Event date: January 9, 2026<br>Event Time: 7:00 AM"),
        ]
    }

    #[test]
    fn display_pipeline_windows_ranks_and_pages() {
        let settings = PipelineSettings {
            events_per_page: 1,
            ..PipelineSettings::default()
        };
        let (windowed, pages) = run(&feed(), now(), &settings);

        let titles: Vec<&str> = windowed.events().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Tonight", "Spring"]);
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.page(1).unwrap().items[0].title, "Spring");
    }

    #[test]
    fn pipeline_is_idempotent() {
        let settings = PipelineSettings::default();
        assert_eq!(run(&feed(), now(), &settings), run(&feed(), now(), &settings));
    }

    #[test]
    fn ingest_drops_past_events_and_keeps_undated_ones() {
        let snapshot = ingest(&feed(), now(), &Chicago);
        let titles: Vec<&str> = snapshot.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Earlier Today", "Tonight", "Spring", "Summer", "No Date"]
        );
        assert_eq!(snapshot[1].start.as_deref(), Some("2026-01-10T00:00:00Z"));
        assert_eq!(snapshot[1].end.as_deref(), Some("2026-01-10T02:00:00Z"));
        assert_eq!(snapshot[4].start, None);
        assert_eq!(snapshot[4].location, "Somewhere");
    }

    #[test]
    fn ingest_keeps_days_without_clock_times_as_plain_dates() {
        let items = vec![raw(
            "Book Sale",
            "Event dates: March 1, 2026 - March 3, 2026<br>Event Time: All Day",
        )];
        let snapshot = ingest(&items, now(), &Chicago);
        assert_eq!(snapshot[0].start.as_deref(), Some("2026-03-01"));
        assert_eq!(snapshot[0].end.as_deref(), Some("2026-03-03"));
        assert_eq!(snapshot[0].time.as_deref(), Some("All Day"));

        // reading the snapshot back gives the same event
        let reread = snapshot[0].normalize(&Chicago).unwrap();
        assert_eq!(Some(reread), items[0].normalize(&Chicago));
    }
}
