//! Single-shot timers for settle and debounce work.
//!
//! The host owns the clock. Handlers schedule a [`TimerKind`] with a delay;
//! scheduling a kind that is already pending moves its deadline instead of
//! stacking a second timer. [`Timers::take_due`] hands back whatever has
//! expired so the engine can run it on the UI thread.

#[cfg(test)]
#[path = "timer_test.rs"]
mod timer_test;

use std::collections::BTreeMap;

/// Delayed jobs the canvas knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Re-enable grid caching and re-commit the viewport after a transform.
    CacheReenable,
    /// Drop the transition style used while animating a zoom-button step.
    TransitionReset,
    /// Reposition overlay UI after a resize storm settles.
    ResizeReposition,
}

/// Pending single-shot timers keyed by kind.
#[derive(Debug, Default, Clone)]
pub struct Timers {
    deadlines: BTreeMap<TimerKind, u64>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire at `now_ms + delay_ms`, replacing any pending one.
    pub fn schedule(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) {
        self.deadlines.insert(kind, now_ms.saturating_add(delay_ms));
    }

    /// Disarm `kind`; returns whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    #[must_use]
    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.deadlines.get(&kind).copied()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.deadlines.len()
    }

    /// Remove and return every timer whose deadline is at or before `now_ms`,
    /// earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let mut due: Vec<(u64, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(kind, deadline)| (*deadline, *kind))
            .collect();
        due.sort_unstable();
        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }
}
