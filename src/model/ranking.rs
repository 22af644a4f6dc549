use std::cmp::Ordering;

use itertools::Itertools;

use super::event::NormalizedEvent;

/// Orders events by start, earliest first, with ties broken by title
///
/// Events without a start sort after every dated event.
pub fn rank(events: impl IntoIterator<Item = NormalizedEvent>) -> Vec<NormalizedEvent> {
    events.into_iter().sorted_by(chronological).collect()
}

/// Keeps the first `events_max` events
pub fn cap(mut events: Vec<NormalizedEvent>, events_max: usize) -> Vec<NormalizedEvent> {
    events.truncate(events_max);
    events
}

pub fn chronological(a: &NormalizedEvent, b: &NormalizedEvent) -> Ordering {
    match (a.start, b.start) {
        (Some(a_start), Some(b_start)) => a_start.cmp(&b_start),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
}
