//! Playback sequencing
//!
//! [`Sequencer`] is the synchronous core; [`PlaybackEngine`] is the tokio task
//! that owns it and turns its effects into timers and published events.

pub mod bindings;
pub mod engine;
pub mod entries;
pub mod sequencer;
pub mod state;
pub mod timers;

pub use engine::{channel, EngineHandle, EngineInbox, PlaybackEngine};
pub use entries::{EntryField, EntryId, EntryList, MediaEntry};
pub use sequencer::{Controls, Effect, Sequencer, SequencerSettings, SequencerSnapshot, Timing};
pub use state::PlaybackState;
