//! Simulated player runtime for the console front end
//!
//! Stands in for a real embedded player: it becomes ready shortly after
//! creation, reports `Playing` after a load, then `Ended` once the configured
//! clip length has elapsed. Video ids starting with `err` report an error
//! instead, which exercises the skip path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::{
    AdapterEvent, AdapterEventSink, PlayerAdapter, PlayerConfig, PlayerFactory, PlayerHandle,
    PlayerState, PlaylistRequest, VideoData,
};

const READY_DELAY: Duration = Duration::from_millis(200);
const START_DELAY: Duration = Duration::from_millis(100);

/// Error code reported for `err*` video ids (the runtime's "not found" code)
pub const SIMULATED_ERROR_CODE: i32 = 100;

/// Factory for [`SimulatedPlayer`]s
pub struct SimulatedPlayerFactory {
    sink: Arc<dyn AdapterEventSink>,
    clip_length: Duration,
}

impl SimulatedPlayerFactory {
    pub fn new(sink: Arc<dyn AdapterEventSink>, clip_length: Duration) -> Self {
        Self { sink, clip_length }
    }
}

impl PlayerFactory for SimulatedPlayerFactory {
    fn create(
        &mut self,
        handle: PlayerHandle,
        container_id: &str,
        config: &PlayerConfig,
    ) -> Box<dyn PlayerAdapter> {
        debug!(
            "Creating simulated {} in #{} ({}x{})",
            handle, container_id, config.width, config.height
        );
        let sink = Arc::clone(&self.sink);
        let ready = tokio::spawn(async move {
            tokio::time::sleep(READY_DELAY).await;
            sink.deliver(AdapterEvent::ready(handle));
        });

        Box::new(SimulatedPlayer {
            handle,
            sink: Arc::clone(&self.sink),
            clip_length: self.clip_length,
            title: None,
            ready: Some(ready),
            playback: None,
        })
    }
}

/// One simulated player
pub struct SimulatedPlayer {
    handle: PlayerHandle,
    sink: Arc<dyn AdapterEventSink>,
    clip_length: Duration,
    title: Option<String>,
    ready: Option<JoinHandle<()>>,
    playback: Option<JoinHandle<()>>,
}

impl SimulatedPlayer {
    fn start_clip(&mut self) {
        self.abort_playback();

        let handle = self.handle;
        let sink = Arc::clone(&self.sink);
        let clip_length = self.clip_length;
        let fails = self
            .title
            .as_deref()
            .map(|t| t.trim_start_matches("Simulated ").starts_with("err"))
            .unwrap_or(false);

        self.playback = Some(tokio::spawn(async move {
            tokio::time::sleep(START_DELAY).await;
            if fails {
                sink.deliver(AdapterEvent::error(handle, SIMULATED_ERROR_CODE));
                return;
            }
            sink.deliver(AdapterEvent::state(handle, PlayerState::Playing));
            tokio::time::sleep(clip_length).await;
            sink.deliver(AdapterEvent::state(handle, PlayerState::Ended));
        }));
    }

    fn abort_playback(&mut self) {
        if let Some(task) = self.playback.take() {
            task.abort();
        }
    }
}

impl PlayerAdapter for SimulatedPlayer {
    fn load_video_by_id(&mut self, video_id: &str) {
        self.title = Some(format!("Simulated {}", video_id));
        self.start_clip();
    }

    fn load_playlist(&mut self, request: &PlaylistRequest) {
        self.title = Some(format!("Simulated {}[{}]", request.list_id, request.start_index));
        self.start_clip();
    }

    fn play_video(&mut self) {
        self.start_clip();
    }

    fn stop_video(&mut self) {
        self.abort_playback();
    }

    fn video_data(&self) -> VideoData {
        VideoData {
            title: self.title.clone(),
        }
    }

    fn destroy(&mut self) {
        self.abort_playback();
        if let Some(task) = self.ready.take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}
