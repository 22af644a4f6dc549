use chrono::{DateTime, Utc};
use log::{debug, trace};

/// Where the display is in its page cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPhase {
    /// Nothing to show
    Idle,
    Displaying(usize),
    /// The current page is fading out while the next one is prepared off screen
    Transitioning { from: usize, to: usize },
}

/// A started page change, finished by [`RotationScheduler::complete_advance`] once the fade settles
///
/// A transition belongs to the page set that was installed when it began. Installing a new set
/// makes it stale, and completing a stale transition does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub generation: u64,
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RotationState {
    pub page_count: usize,
    /// Always below `page_count` when there are pages
    pub current_index: usize,
    pub last_advance: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct RotationScheduler {
    state: RotationState,
    phase: RotationPhase,
    generation: u64,
}

impl Default for RotationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationScheduler {
    pub fn new() -> Self {
        RotationScheduler {
            state: RotationState::default(),
            phase: RotationPhase::Idle,
            generation: 0,
        }
    }

    /// Resumes from an existing state, clamping an out of range index to the first page
    pub fn with_state(mut state: RotationState) -> Self {
        let phase = if state.page_count == 0 {
            RotationPhase::Idle
        } else {
            if state.current_index >= state.page_count {
                state.current_index = 0;
            }
            RotationPhase::Displaying(state.current_index)
        };
        RotationScheduler {
            state,
            phase,
            generation: 0,
        }
    }

    /// Starts over on the first page of a freshly computed page set
    ///
    /// Any transition in flight is superseded.
    pub fn install(&mut self, page_count: usize, now: DateTime<Utc>) -> RotationPhase {
        self.generation += 1;
        self.state = RotationState {
            page_count,
            current_index: 0,
            last_advance: Some(now),
        };
        self.phase = if page_count == 0 {
            RotationPhase::Idle
        } else {
            RotationPhase::Displaying(0)
        };
        debug!(
            "installed {} pages (generation {})",
            page_count, self.generation
        );
        self.phase
    }

    /// Begins fading to the next page, wrapping after the last one
    ///
    /// Returns `None` when there are no pages or a transition is already running.
    pub fn begin_advance(&mut self) -> Option<Transition> {
        if self.state.page_count == 0 {
            trace!("no pages to advance");
            return None;
        }
        if let RotationPhase::Transitioning { .. } = self.phase {
            trace!("transition already in flight");
            return None;
        }

        if self.state.current_index >= self.state.page_count {
            self.state.current_index = 0;
        }
        let from = self.state.current_index;
        let to = (from + 1) % self.state.page_count;
        self.phase = RotationPhase::Transitioning { from, to };

        Some(Transition {
            generation: self.generation,
            from,
            to,
        })
    }

    /// Finishes a transition, returning the index now on screen
    pub fn complete_advance(&mut self, transition: Transition, now: DateTime<Utc>) -> Option<usize> {
        if transition.generation != self.generation {
            debug!(
                "discarding transition to page {} from generation {}, now at {}",
                transition.to, transition.generation, self.generation
            );
            return None;
        }

        self.state.current_index = transition.to;
        self.state.last_advance = Some(now);
        self.phase = RotationPhase::Displaying(transition.to);
        Some(transition.to)
    }

    /// Moves to the next page without waiting for a fade
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<usize> {
        let transition = self.begin_advance()?;
        self.complete_advance(transition, now)
    }

    #[must_use]
    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn page_count(&self) -> usize {
        self.state.page_count
    }
}
