use super::event::NormalizedEvent;

/// A fixed size slice of the ranked events, shown for one rotation interval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub items: Vec<NormalizedEvent>,
}

/// Splits ranked events into pages of `page_size`, the last page may be short
///
/// A `page_size` of zero is treated as one.
pub fn paginate(ranked_events: &[NormalizedEvent], page_size: usize) -> Vec<Page> {
    ranked_events
        .chunks(page_size.max(1))
        .enumerate()
        .map(|(index, items)| Page {
            index,
            items: items.to_owned(),
        })
        .collect()
}

/// The pages of one pipeline run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageCache {
    pages: Vec<Page>,
}

impl PageCache {
    pub fn new(ranked_events: &[NormalizedEvent], page_size: usize) -> Self {
        PageCache {
            pages: paginate(ranked_events, page_size),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        self.pages.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn events(count: usize) -> Vec<NormalizedEvent> {
        (0..count)
            .map(|i| NormalizedEvent {
                title: format!("event {}", i),
                start: None,
                end: None,
                location: String::new(),
                link: String::new(),
                ..NormalizedEvent::default()
            })
            .collect()
    }

    #[test]
    fn ten_events_make_three_pages() {
        let cache = PageCache::new(&events(10), 4);
        assert_eq!(cache.page_count(), 3);
        let sizes: Vec<usize> = cache.pages().iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        let indexes: Vec<usize> = cache.pages().iter().map(|p| p.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(cache.page(2).unwrap().items[1].title, "event 9");
    }

    #[test]
    fn no_events_make_no_pages() {
        assert_eq!(PageCache::new(&[], 4).page_count(), 0);
        assert!(PageCache::new(&[], 4).page(0).is_none());
    }

    #[test]
    fn exact_multiple_has_no_short_page() {
        assert_eq!(paginate(&events(8), 4).len(), 2);
        assert_eq!(paginate(&events(3), 0).len(), 3);
    }
}
