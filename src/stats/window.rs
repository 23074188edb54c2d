//! Bounded most-recent-first history.

use std::collections::VecDeque;
use std::time::Duration;

/// A fixed-capacity history where index 0 is always the newest entry.
///
/// Pushing onto a full window drops the oldest entry.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, value: T) {
        self.items.push_front(value);
        self.items.truncate(self.cap);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> RollingWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl RollingWindow<Duration> {
    /// Arithmetic mean of the window, zero when empty.
    pub fn average(&self) -> Duration {
        if self.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.items.iter().sum();
        total / self.len() as u32
    }
}
