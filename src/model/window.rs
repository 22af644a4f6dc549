use chrono::{DateTime, Months, NaiveTime, Utc};
use chrono_tz::Tz;
use log::debug;

use super::event::{localize, NormalizedEvent};
use super::ranking::{cap, rank};

/// The moment `horizon_months` calendar months after `now`, counted on the wall clock in `tz`
///
/// Month arithmetic keeps the day of month (Nov 15 + 4 months is Mar 15) and clamps to the last
/// day of shorter months.
pub fn horizon_end(now: DateTime<Utc>, horizon_months: u32, tz: &Tz) -> DateTime<Utc> {
    now.with_timezone(tz)
        .naive_local()
        .checked_add_months(Months::new(horizon_months))
        .and_then(|end| localize(end, tz))
        // the wall clock time may not exist on the target day, fall back to plain UTC months
        .or_else(|| now.checked_add_months(Months::new(horizon_months)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Keeps the events whose start lies in `now..=now + horizon_months`
///
/// Events without a start are dropped.
pub fn filter(
    events: impl IntoIterator<Item = NormalizedEvent>,
    now: DateTime<Utc>,
    horizon_months: u32,
    tz: &Tz,
) -> Vec<NormalizedEvent> {
    let max_date = horizon_end(now, horizon_months, tz);
    events
        .into_iter()
        .filter(|event| match event.start {
            Some(start) => now <= start && start <= max_date,
            None => {
                debug!("dropping event without a start from the window: {}", event.title);
                false
            }
        })
        .collect()
}

/// Whether an event is over, used when writing the snapshot
///
/// An event stays current until the end of the day (23:59:59.999 in `tz`) on which it ends, or
/// starts when it has no end. Events whose dates could not be read are never considered past.
pub fn is_past_event(event: &NormalizedEvent, now: DateTime<Utc>, tz: &Tz) -> bool {
    let Some(last) = event.end.or(event.start) else {
        return false;
    };

    let last_day = last.with_timezone(tz).date_naive();
    match NaiveTime::from_hms_milli_opt(23, 59, 59, 999).and_then(|t| localize(last_day.and_time(t), tz)) {
        Some(end_of_day) => end_of_day < now,
        None => false,
    }
}

/// The chronologically ordered, capped set of events currently worth showing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowedSet {
    now: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
    events: Vec<NormalizedEvent>,
}

impl WindowedSet {
    /// Filters, ranks, and caps `events` against a single captured `now`
    pub fn compute(
        events: impl IntoIterator<Item = NormalizedEvent>,
        now: DateTime<Utc>,
        horizon_months: u32,
        events_max: usize,
        tz: &Tz,
    ) -> Self {
        let retained = filter(events, now, horizon_months, tz);
        let retained_count = retained.len();
        let events = cap(rank(retained), events_max);
        debug!(
            "window {} to {} kept {} events, showing {}",
            now,
            horizon_end(now, horizon_months, tz),
            retained_count,
            events.len()
        );

        WindowedSet {
            now,
            horizon_end: horizon_end(now, horizon_months, tz),
            events,
        }
    }

    pub fn empty(now: DateTime<Utc>) -> Self {
        WindowedSet {
            now,
            horizon_end: now,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[NormalizedEvent] {
        self.events.as_ref()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn horizon_end(&self) -> DateTime<Utc> {
        self.horizon_end
    }
}
