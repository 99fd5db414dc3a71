//! Event types for the vloop event system
//!
//! Provides shared event definitions and the EventBus used to publish
//! sequencer status to whatever presentation layer is attached.

mod playback_types;

pub use playback_types::{PlaybackState, SkipReason};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// vloop event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to a front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VloopEvent {
    /// Human-readable status line changed
    ///
    /// Emitted on every sequencer transition; this is the single status
    /// string a presentation layer shows.
    StatusChanged {
        /// New status text
        status: String,
        /// When status changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sequencer state changed
    PlaybackStateChanged {
        /// State before change
        old_state: PlaybackState,
        /// State after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A load command was issued to an entry's player
    EntryLoading {
        /// Entry being loaded
        entry_id: Uuid,
        /// Entry URL as configured
        url: String,
        /// When the load was issued
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An entry was skipped because of a per-entry problem
    EntrySkipped {
        /// Entry that was skipped
        entry_id: Uuid,
        /// Why it was skipped
        reason: SkipReason,
        /// When the skip was scheduled
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An entry played through all of its loops
    EntryFinished {
        /// Entry that finished
        entry_id: Uuid,
        /// Loops played (including the last one)
        loops_played: u32,
        /// Delay before the next entry, in seconds
        delay_seconds: u32,
        /// When the entry finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl VloopEvent {
    /// Convenience constructor for a status update stamped now
    pub fn status(status: impl Into<String>) -> Self {
        VloopEvent::StatusChanged {
            status: status.into(),
            timestamp: crate::time::now(),
        }
    }

    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            VloopEvent::StatusChanged { .. } => "StatusChanged",
            VloopEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            VloopEvent::EntryLoading { .. } => "EntryLoading",
            VloopEvent::EntrySkipped { .. } => "EntrySkipped",
            VloopEvent::EntryFinished { .. } => "EntryFinished",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use vloop_common::events::{EventBus, VloopEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(VloopEvent::status("Stopped."));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VloopEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<VloopEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VloopEvent,
    ) -> Result<usize, broadcast::error::SendError<VloopEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: VloopEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
