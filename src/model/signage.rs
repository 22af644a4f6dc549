use chrono::{DateTime, Utc};
use log::{info, warn};

use super::feed_source::{FeedError, FeedItem};
use super::pages::{Page, PageCache};
use super::pipeline::{self, PipelineSettings};
use super::rotation::{RotationPhase, RotationScheduler, RotationState, Transition};
use super::window::WindowedSet;

/// Everything the display shows, owned in one place
///
/// Only [`Signage::refresh`] and the advance methods change it, so a failed refresh can never
/// leave the window, the pages, and the rotation out of step with each other.
#[derive(Debug)]
pub struct Signage {
    settings: PipelineSettings,
    windowed: WindowedSet,
    pages: PageCache,
    rotation: RotationScheduler,
}

impl Signage {
    pub fn new(settings: PipelineSettings, now: DateTime<Utc>) -> Self {
        Signage {
            settings,
            windowed: WindowedSet::empty(now),
            pages: PageCache::default(),
            rotation: RotationScheduler::new(),
        }
    }

    /// Replaces the shown events with a fresh pipeline run and starts over at the first page
    ///
    /// Returns the page to show now, if any.
    pub fn refresh(&mut self, items: &[FeedItem], now: DateTime<Utc>) -> Option<&Page> {
        let (windowed, pages) = pipeline::run(items, now, &self.settings);
        self.windowed = windowed;
        self.pages = pages;
        self.rotation.install(self.pages.page_count(), now);
        self.current_page()
    }

    /// Records a refresh that produced nothing, the last good events stay on screen
    pub fn refresh_failed(&self, error: &FeedError) {
        warn!(
            "feed refresh failed, keeping {} events on {} pages: {}",
            self.windowed.len(),
            self.pages.page_count(),
            error
        );
    }

    /// Starts fading to the next page and returns it so it can be prepared off screen
    pub fn begin_advance(&mut self) -> Option<(Transition, &Page)> {
        let transition = self.rotation.begin_advance()?;
        let page = self.pages.page(transition.to)?;
        Some((transition, page))
    }

    /// Finishes a transition, `None` if a refresh superseded it
    pub fn complete_advance(&mut self, transition: Transition, now: DateTime<Utc>) -> Option<&Page> {
        let index = self.rotation.complete_advance(transition, now)?;
        info!("showing page {} of {}", index + 1, self.pages.page_count());
        self.pages.page(index)
    }

    /// Moves straight to the next page
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<&Page> {
        let index = self.rotation.advance(now)?;
        self.pages.page(index)
    }

    pub fn current_page(&self) -> Option<&Page> {
        match self.rotation.phase() {
            RotationPhase::Idle => None,
            RotationPhase::Displaying(index) | RotationPhase::Transitioning { from: index, .. } => {
                self.pages.page(index)
            }
        }
    }

    #[must_use]
    pub fn windowed(&self) -> &WindowedSet {
        &self.windowed
    }

    #[must_use]
    pub fn pages(&self) -> &PageCache {
        &self.pages
    }

    #[must_use]
    pub fn rotation_state(&self) -> &RotationState {
        self.rotation.state()
    }

    pub fn phase(&self) -> RotationPhase {
        self.rotation.phase()
    }
}
