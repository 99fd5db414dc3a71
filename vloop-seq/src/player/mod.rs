//! Embedded player contract
//!
//! The sequencer never talks to a concrete player runtime. It drives
//! [`PlayerAdapter`] trait objects created through a [`PlayerFactory`], and it
//! receives their lifecycle as [`AdapterEvent`]s tagged with the
//! [`PlayerHandle`] it assigned at creation time. The handle is how stale
//! events from destroyed or non-current players are recognized and dropped.

#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod simulated;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(any(test, feature = "test-util"))]
pub use recording::{PlayerCommand, RecordingPlayerFactory};
pub use simulated::SimulatedPlayerFactory;

/// Identity of one created player instance
///
/// Handles are never reused within a sequencer, so an event carrying the
/// handle of a destroyed player can never be mistaken for a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerHandle(pub u64);

impl std::fmt::Display for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Player state as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    /// Map the runtime's numeric state code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }
}

/// What happened to a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEventKind {
    /// Player finished initializing and accepts commands
    Ready,
    /// Playback state changed
    StateChange(PlayerState),
    /// Runtime reported an error code
    Error(i32),
}

/// Lifecycle event from one player instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterEvent {
    pub handle: PlayerHandle,
    pub kind: AdapterEventKind,
}

impl AdapterEvent {
    pub fn ready(handle: PlayerHandle) -> Self {
        Self {
            handle,
            kind: AdapterEventKind::Ready,
        }
    }

    pub fn state(handle: PlayerHandle, state: PlayerState) -> Self {
        Self {
            handle,
            kind: AdapterEventKind::StateChange(state),
        }
    }

    pub fn error(handle: PlayerHandle, code: i32) -> Self {
        Self {
            handle,
            kind: AdapterEventKind::Error(code),
        }
    }
}

/// Anything that accepts adapter events (the engine's inbox, in practice)
pub trait AdapterEventSink: Send + Sync {
    fn deliver(&self, event: AdapterEvent);
}

/// Metadata the player exposes about what it has loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoData {
    pub title: Option<String>,
}

/// Arguments of a playlist load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub list_id: String,
    pub start_index: u32,
    pub suggested_quality: String,
}

/// Player variables passed to every created player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerVars {
    pub playsinline: u8,
    pub controls: u8,
    pub rel: u8,
    pub modestbranding: u8,
}

impl Default for PlayerVars {
    fn default() -> Self {
        Self {
            playsinline: 1,
            controls: 1,
            rel: 0,
            modestbranding: 1,
        }
    }
}

/// Construction settings for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: String,
    pub height: String,
    pub vars: PlayerVars,
    /// Quality hint sent with playlist loads
    pub suggested_quality: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "100%".to_string(),
            vars: PlayerVars::default(),
            suggested_quality: "large".to_string(),
        }
    }
}

/// One embedded player instance
///
/// Commands are fire-and-forget; outcomes arrive later as [`AdapterEvent`]s.
pub trait PlayerAdapter: Send {
    fn load_video_by_id(&mut self, video_id: &str);
    fn load_playlist(&mut self, request: &PlaylistRequest);
    fn play_video(&mut self);
    fn stop_video(&mut self);
    fn video_data(&self) -> VideoData;
    fn destroy(&mut self);
}

/// Creates players once the runtime has signaled it is available
pub trait PlayerFactory: Send {
    fn create(
        &mut self,
        handle: PlayerHandle,
        container_id: &str,
        config: &PlayerConfig,
    ) -> Box<dyn PlayerAdapter>;
}

/// DOM-style container id for an entry's player slot
pub fn container_id(entry_id: &Uuid) -> String {
    format!("player-{}", entry_id)
}
