//! Headless player that records every command it receives
//!
//! Test double for the sequencer, built for unit tests and behind the
//! `test-util` feature. It never emits events on its own; whoever drives it
//! delivers `Ready`, state changes and errors explicitly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{PlayerAdapter, PlayerConfig, PlayerFactory, PlayerHandle, PlaylistRequest, VideoData};

/// A command observed by a recording player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Created { container_id: String },
    LoadVideo(String),
    LoadPlaylist(PlaylistRequest),
    Play,
    Stop,
    Destroy,
}

type Log = Arc<Mutex<Vec<(PlayerHandle, PlayerCommand)>>>;
type Titles = Arc<Mutex<HashMap<PlayerHandle, String>>>;

/// Factory whose players append to one shared command log
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayerFactory {
    log: Log,
    titles: Titles,
}

impl RecordingPlayerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command so far, in issue order
    pub fn commands(&self) -> Vec<(PlayerHandle, PlayerCommand)> {
        lock(&self.log).clone()
    }

    /// Commands issued to one player
    pub fn commands_for(&self, handle: PlayerHandle) -> Vec<PlayerCommand> {
        lock(&self.log)
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Handles of every player created so far
    pub fn created(&self) -> Vec<PlayerHandle> {
        lock(&self.log)
            .iter()
            .filter(|(_, c)| matches!(c, PlayerCommand::Created { .. }))
            .map(|(h, _)| *h)
            .collect()
    }

    /// Forget recorded commands (titles are kept)
    pub fn clear(&self) {
        lock(&self.log).clear();
    }

    /// Title a player reports through `video_data`
    pub fn set_title(&self, handle: PlayerHandle, title: &str) {
        lock(&self.titles).insert(handle, title.to_string());
    }
}

impl PlayerFactory for RecordingPlayerFactory {
    fn create(
        &mut self,
        handle: PlayerHandle,
        container_id: &str,
        _config: &PlayerConfig,
    ) -> Box<dyn PlayerAdapter> {
        lock(&self.log).push((
            handle,
            PlayerCommand::Created {
                container_id: container_id.to_string(),
            },
        ));
        Box::new(RecordingPlayer {
            handle,
            log: Arc::clone(&self.log),
            titles: Arc::clone(&self.titles),
        })
    }
}

struct RecordingPlayer {
    handle: PlayerHandle,
    log: Log,
    titles: Titles,
}

impl RecordingPlayer {
    fn record(&self, command: PlayerCommand) {
        lock(&self.log).push((self.handle, command));
    }
}

impl PlayerAdapter for RecordingPlayer {
    fn load_video_by_id(&mut self, video_id: &str) {
        self.record(PlayerCommand::LoadVideo(video_id.to_string()));
    }

    fn load_playlist(&mut self, request: &PlaylistRequest) {
        self.record(PlayerCommand::LoadPlaylist(request.clone()));
    }

    fn play_video(&mut self) {
        self.record(PlayerCommand::Play);
    }

    fn stop_video(&mut self) {
        self.record(PlayerCommand::Stop);
    }

    fn video_data(&self) -> VideoData {
        VideoData {
            title: lock(&self.titles).get(&self.handle).cloned(),
        }
    }

    fn destroy(&mut self) {
        self.record(PlayerCommand::Destroy);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_recorded_per_handle() {
        let mut factory = RecordingPlayerFactory::new();
        let mut a = factory.create(PlayerHandle(1), "player-a", &PlayerConfig::default());
        let mut b = factory.create(PlayerHandle(2), "player-b", &PlayerConfig::default());

        a.load_video_by_id("abc");
        b.play_video();
        a.stop_video();

        assert_eq!(factory.created(), vec![PlayerHandle(1), PlayerHandle(2)]);
        assert_eq!(
            factory.commands_for(PlayerHandle(1))[1..],
            [PlayerCommand::LoadVideo("abc".into()), PlayerCommand::Stop]
        );
        assert_eq!(factory.commands_for(PlayerHandle(2))[1..], [PlayerCommand::Play]);
    }

    #[test]
    fn test_title_lookup() {
        let mut factory = RecordingPlayerFactory::new();
        let player = factory.create(PlayerHandle(7), "player-x", &PlayerConfig::default());
        assert_eq!(player.video_data().title, None);

        factory.set_title(PlayerHandle(7), "Lobby loop");
        assert_eq!(player.video_data().title.as_deref(), Some("Lobby loop"));
    }
}
