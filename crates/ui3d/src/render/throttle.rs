//! Leading+trailing throttle over a single pending slot.

use crate::components::ContentSource;
use webplane_core::Millis;

/// Result of submitting to a [`Throttle`].
#[derive(Debug, PartialEq)]
pub enum Throttled<T> {
    /// Run now.
    Run(T),
    /// Parked in the pending slot until `until`.
    Deferred { until: Millis },
}

/// Leading+trailing throttle.
///
/// The first submission in a quiet period runs immediately. Submissions
/// inside the interval are merged into one pending item, which
/// [`Throttle::poll`] releases at `last_run + interval`.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Option<u64>,
    last_run: Option<Millis>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    /// `None` disables throttling: every submission runs.
    pub fn new(interval_ms: Option<u64>) -> Self {
        Self {
            interval: interval_ms,
            last_run: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Option<u64> {
        self.interval
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// When the pending item becomes due, if there is one.
    pub fn next_due(&self) -> Option<Millis> {
        self.pending.as_ref()?;
        self.due()
    }

    /// Submit, replacing any pending item.
    pub fn submit(&mut self, now: Millis, item: T) -> Throttled<T> {
        self.submit_with(now, item, |_, next| next)
    }

    /// Submit, combining with the pending item through `merge(pending, next)`.
    pub fn submit_with(
        &mut self,
        now: Millis,
        item: T,
        merge: impl FnOnce(Option<T>, T) -> T,
    ) -> Throttled<T> {
        let item = merge(self.pending.take(), item);
        match self.due() {
            Some(due) if now < due => {
                self.pending = Some(item);
                Throttled::Deferred { until: due }
            }
            _ => {
                self.last_run = Some(now);
                Throttled::Run(item)
            }
        }
    }

    /// Release the pending item once its deadline has passed.
    pub fn poll(&mut self, now: Millis) -> Option<T> {
        let due = self.next_due()?;
        if now < due {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }

    fn due(&self) -> Option<Millis> {
        Some(self.last_run?.advance(self.interval?))
    }
}

/// What a throttled panel render will do when it runs.
#[derive(Debug)]
pub enum PendingRender {
    /// Replace the content tree, then render it.
    Content(ContentSource),
    /// Re-render the current tree after it changed in place.
    Refresh,
}

impl PendingRender {
    /// Merge rule for the pending slot: newer content wins, but a refresh
    /// never displaces content that has not been built yet.
    pub fn merge(pending: Option<PendingRender>, next: PendingRender) -> PendingRender {
        match (pending, next) {
            (Some(PendingRender::Content(content)), PendingRender::Refresh) => {
                PendingRender::Content(content)
            }
            (_, next) => next,
        }
    }
}
