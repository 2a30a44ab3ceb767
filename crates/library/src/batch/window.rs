use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Completions older than this no longer count against the limit. A second
/// over the minute keeps us clear of services counting on whole minutes.
pub const WINDOW: Duration = Duration::from_secs(61);

/// Sliding window of recent completions, enforcing at most `limit`
/// completions per [`WINDOW`].
#[derive(Debug)]
pub struct RateWindow {
    limit: usize,
    completions: VecDeque<Instant>,
}

impl RateWindow {
    /// A limit of zero is treated as one.
    pub fn new(limit: u32) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX).max(1);
        Self { limit, completions: VecDeque::with_capacity(limit.min(1024)) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.completions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.completions.front() {
            if now.saturating_duration_since(*oldest) > WINDOW {
                self.completions.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long to wait before starting another file, if at all.
    pub fn delay(&mut self, now: Instant) -> Option<Duration> {
        self.evict(now);
        if self.completions.len() < self.limit {
            return None;
        }
        let oldest = self.completions.front()?;
        let wait = WINDOW.saturating_sub(now.saturating_duration_since(*oldest));
        (!wait.is_zero()).then_some(wait)
    }

    /// Records a completed file.
    pub fn record(&mut self, now: Instant) {
        self.completions.push_back(now);
    }
}
