//! Playback-related type definitions
//!
//! Supporting types for the sequencer state and skip bookkeeping.

use serde::{Deserialize, Serialize};

/// Sequencer state enumeration
///
/// `Loading`, `Playing` and `Paused` together make up "a run is in progress";
/// `Stopped` behaves like `Idle` but records that a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing started yet
    Idle,
    /// Start requested outside every schedule window; rechecking periodically
    WaitingForSchedule,
    /// Selecting, resolving or loading the current entry
    Loading,
    /// Current adapter reported it is playing
    Playing,
    /// Current adapter reported it is paused
    Paused,
    /// Run ended by explicit stop, schedule exit, removal or an empty list
    Stopped,
}

impl PlaybackState {
    /// True while a run is in progress (the `isPlaying` flag)
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    /// True when a start intent may begin a new run
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            PlaybackState::Idle | PlaybackState::Stopped | PlaybackState::WaitingForSchedule
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::WaitingForSchedule => write!(f, "waiting_for_schedule"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why an entry was skipped instead of played to completion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum SkipReason {
    /// URL was empty, unparseable, or carried neither a video nor a playlist id
    InvalidUrl,
    /// Entry had no player binding, or its player had not signaled ready
    AdapterNotReady,
    /// Player reported an error while loading or playing
    AdapterPlaybackError,
    /// No entry with a URL is left; the run halts instead of skipping
    EmptyList,
}

impl SkipReason {
    /// Ends the run rather than moving on to the next entry
    pub fn halts_run(&self) -> bool {
        matches!(self, SkipReason::EmptyList)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidUrl => write!(f, "InvalidUrl"),
            SkipReason::AdapterNotReady => write!(f, "AdapterNotReady"),
            SkipReason::AdapterPlaybackError => write!(f, "AdapterPlaybackError"),
            SkipReason::EmptyList => write!(f, "EmptyList"),
        }
    }
}
