use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Default pause between revealing consecutive themes.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(250);

/// Items waiting to become visible, each with its own deadline.
///
/// Deadlines are fixed when the schedule is built, so a late poll reveals
/// everything that is due at once rather than drifting.
#[derive(Debug)]
pub struct RevealSchedule<T> {
    pending: VecDeque<(Instant, T)>,
}

impl<T> Default for RevealSchedule<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<T> RevealSchedule<T> {
    /// Item `i` (0-based) is due at `start + (i + 1) * interval`.
    pub fn new(items: impl IntoIterator<Item = T>, start: Instant, interval: Duration) -> Self {
        let pending = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let steps = u32::try_from(i + 1).unwrap_or(u32::MAX);
                (start + interval.saturating_mul(steps), item)
            })
            .collect();
        Self { pending }
    }

    /// Pop every item whose deadline is at or before `now`, in order.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        while self.pending.front().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, item)) = self.pending.pop_front() {
                due.push(item);
            }
        }
        due
    }

    /// Pop everything regardless of deadline.
    pub fn take_all(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|(_, item)| item).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.front().map(|(at, _)| *at)
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
