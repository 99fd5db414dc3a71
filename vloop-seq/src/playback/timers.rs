//! Armed timer bookkeeping
//!
//! The sequencer never sleeps. It records which timers it wants, and the
//! engine turns them into tokio sleeps that report back by id. A firing whose
//! id is no longer armed (cancelled by stop, or superseded) is ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use vloop_common::events::SkipReason;

/// Identity of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Why a pending advance was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceCause {
    /// Entry played all its loops; the delay is the entry's own
    Finished,
    /// Entry could not be played
    Skip(SkipReason),
}

/// What to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Retry a start that was blocked by the schedule
    ScheduleRecheck,
    /// Stop the run if the schedule window has closed
    ScheduleExitPoll,
    /// Move to the next valid entry
    Advance(AdvanceCause),
}

impl TimerKind {
    pub fn is_advance(&self) -> bool {
        matches!(self, TimerKind::Advance(_))
    }
}

/// One armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub delay: Duration,
}

/// Set of armed timers
#[derive(Debug, Default)]
pub struct TimerSet {
    armed: BTreeMap<TimerId, ArmedTimer>,
    next_id: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new timer and return its id
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.armed.insert(id, ArmedTimer { id, kind, delay });
        id
    }

    /// Consume a firing; `None` means the timer was no longer armed
    pub fn take_fired(&mut self, id: TimerId) -> Option<TimerKind> {
        self.armed.remove(&id).map(|t| t.kind)
    }

    /// Disarm every timer matching `pred`, returning their ids
    pub fn cancel_where(&mut self, pred: impl Fn(&TimerKind) -> bool) -> Vec<TimerId> {
        let ids: Vec<TimerId> = self
            .armed
            .values()
            .filter(|t| pred(&t.kind))
            .map(|t| t.id)
            .collect();
        for id in &ids {
            self.armed.remove(id);
        }
        ids
    }

    /// Disarm everything, returning the ids that were armed
    pub fn cancel_all(&mut self) -> Vec<TimerId> {
        let ids = self.armed.keys().copied().collect();
        self.armed.clear();
        ids
    }

    pub fn has(&self, kind: TimerKind) -> bool {
        self.armed.values().any(|t| t.kind == kind)
    }

    pub fn has_advance(&self) -> bool {
        self.armed.values().any(|t| t.kind.is_advance())
    }

    /// Armed timers in arming order
    pub fn armed(&self) -> Vec<ArmedTimer> {
        self.armed.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}
