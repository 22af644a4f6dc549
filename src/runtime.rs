use color_eyre::eyre::Result;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};

use crate::configuration::config::Config;
use crate::model::clock::Clock;
use crate::model::feed_source::{FeedError, FeedItem, FeedSource};
use crate::model::pipeline::PipelineSettings;
use crate::model::rotation::Transition;
use crate::model::signage::Signage;
use crate::views::page_view::{DisplayFormat, PageContext, Renderer};

type FetchResult = (u64, Result<Vec<FeedItem>, FeedError>);

/// The three timers driving the display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeTimings {
    pub page_interval: Duration,
    pub fade_settle: Duration,
    pub refresh_interval: Duration,
}

impl RuntimeTimings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(RuntimeTimings {
            page_interval: config.page_interval()?,
            fade_settle: config.fade_settle()?,
            refresh_interval: config.refresh_interval()?,
        })
    }
}

/// Numbers feed requests so that only the newest response is applied
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, id: u64) -> bool {
        id == self.latest
    }
}

/// Runs refresh and rotation on a single task, so the signage state needs no locking
pub struct SignageRuntime<S, C, R> {
    source: Arc<S>,
    clock: C,
    renderer: R,
    signage: Signage,
    format: DisplayFormat,
    timings: RuntimeTimings,
    requests: RequestTracker,
}

impl<S, C, R> SignageRuntime<S, C, R>
where
    S: FeedSource,
    C: Clock,
    R: Renderer,
{
    pub fn new(
        source: S,
        clock: C,
        renderer: R,
        settings: PipelineSettings,
        format: DisplayFormat,
        timings: RuntimeTimings,
    ) -> Self {
        let now = clock.now();
        SignageRuntime {
            source: Arc::new(source),
            clock,
            renderer,
            signage: Signage::new(settings, now),
            format,
            timings,
            requests: RequestTracker::default(),
        }
    }

    #[must_use]
    pub fn signage(&self) -> &Signage {
        &self.signage
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Drives the display until `shutdown` completes
    ///
    /// The feed is fetched right away and then every refresh interval. A fetched set always
    /// wins over a page change in flight: the change is dropped and rotation restarts at the
    /// first page with a fresh page timer. Failed fetches leave the display untouched.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<FetchResult>(8);

        let mut refresh = interval(self.timings.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let page_interval = self.timings.page_interval;
        let mut rotation = interval_at(Instant::now() + page_interval, page_interval);
        rotation.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let settle = sleep(Duration::ZERO);
        tokio::pin!(settle);
        let mut pending: Option<Transition> = None;

        tokio::pin!(shutdown);

        info!(
            "display running: pages every {:?}, feed every {:?}",
            self.timings.page_interval, self.timings.refresh_interval
        );

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("shutting down display");
                    break;
                }
                Some((id, result)) = rx.recv() => {
                    if !self.requests.is_latest(id) {
                        debug!("discarding response to superseded feed request {}", id);
                        continue;
                    }
                    match result {
                        Ok(items) => {
                            if let Some(transition) = pending.take() {
                                debug!("refresh supersedes the change to page {}", transition.to);
                            }
                            self.install(&items);
                            rotation.reset();
                        }
                        Err(error) => self.signage.refresh_failed(&error),
                    }
                }
                () = &mut settle, if pending.is_some() => {
                    if let Some(transition) = pending.take() {
                        self.finish_transition(transition);
                    }
                }
                _ = rotation.tick() => {
                    if pending.is_none() {
                        pending = self.start_transition();
                        if pending.is_some() {
                            settle.as_mut().reset(Instant::now() + self.timings.fade_settle);
                        }
                    }
                }
                _ = refresh.tick() => {
                    self.spawn_fetch(&tx);
                }
            }
        }

        Ok(())
    }

    fn spawn_fetch(&mut self, tx: &mpsc::Sender<FetchResult>) {
        let id = self.requests.issue();
        let source = Arc::clone(&self.source);
        let tx = tx.clone();
        debug!("issuing feed request {}", id);
        tokio::spawn(async move {
            let result = source.fetch().await;
            // a closed channel means the display has shut down
            let _ = tx.send((id, result)).await;
        });
    }

    fn install(&mut self, items: &[FeedItem]) {
        let now = self.clock.now();
        self.signage.refresh(items, now);

        let page_count = self.signage.pages().page_count();
        let result = match self.signage.current_page() {
            Some(page) => {
                let context = PageContext::new(page, page_count, &self.format);
                self.renderer.show(&context)
            }
            None => self.renderer.clear(),
        };
        report(result);
    }

    fn start_transition(&mut self) -> Option<Transition> {
        let page_count = self.signage.pages().page_count();
        let (transition, page) = self.signage.begin_advance()?;
        let context = PageContext::new(page, page_count, &self.format);

        report(self.renderer.fade_out(transition.from));
        report(self.renderer.render_hidden(&context));
        Some(transition)
    }

    fn finish_transition(&mut self, transition: Transition) {
        let now = self.clock.now();
        if self.signage.complete_advance(transition, now).is_some() {
            report(self.renderer.fade_in(transition.to));
        }
    }
}

/// Rendering problems are logged, the display keeps running
fn report(result: Result<()>) {
    if let Err(error) = result {
        warn!("could not render page: {:#}", error);
    }
}
