//! Playback sequencer
//!
//! Decides what to load, when to loop, when to advance and when the schedule
//! allows playback. The sequencer is synchronous and single-owner: intents,
//! adapter events and timer firings are applied one at a time through `&mut
//! self`, and everything it wants done asynchronously (arming or cancelling a
//! timer, publishing an event) is queued as an [`Effect`] for the engine.
//!
//! Per-entry problems never end a run. A bad URL, a player that is not ready
//! yet, or a player error all become a status line plus a delayed advance. A
//! run only ends on stop, schedule exit, removal of the playing entry, or when
//! no valid entry is left.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use vloop_common::events::{SkipReason, VloopEvent};
use vloop_common::{uuid_utils, Clock};

use super::bindings::BindingMap;
use super::entries::{EntryField, EntryId, EntryList, MediaEntry};
use super::state::{PlaybackState, StateMachine};
use super::timers::{AdvanceCause, ArmedTimer, TimerId, TimerKind, TimerSet};
use crate::error::{Error, Result};
use crate::player::{
    AdapterEvent, AdapterEventKind, PlayerConfig, PlayerFactory, PlayerHandle, PlayerState,
    PlaylistRequest,
};
use crate::schedule::{Schedule, ScheduleWindow, WindowField};
use crate::url_resolver;

/// Interval between start retries while outside the schedule
pub const SCHEDULE_RECHECK_INTERVAL: Duration = Duration::from_secs(60);
/// Interval between "has the window closed" checks while playing
pub const SCHEDULE_EXIT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Backoff before skipping an unplayable or not-ready entry
pub const SKIP_BACKOFF: Duration = Duration::from_secs(2);
/// Backoff before skipping an entry whose player reported an error
pub const ERROR_BACKOFF: Duration = Duration::from_secs(3);

pub const STATUS_READY: &str = "Ready. Add videos to start.";
pub const STATUS_STOPPED: &str = "Stopped.";
pub const STATUS_WAITING: &str = "Outside of scheduled time. Waiting...";
pub const STATUS_SCHEDULED_STOP: &str = "Scheduled stop time reached.";
pub const STATUS_REMOVED: &str = "Stopped because the playing video was removed.";
pub const STATUS_NO_VALID_TO_PLAY: &str = "No valid videos to play.";
pub const STATUS_NO_VALID_IN_LIST: &str = "No valid videos in the list.";
pub const STATUS_PLAYER_ERROR: &str = "Error playing video. Skipping.";
pub const STATUS_PAUSED: &str = "Paused.";

/// Fixed delays used by the sequencer
///
/// These never grow: every retry waits the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub schedule_recheck: Duration,
    pub schedule_exit_poll: Duration,
    pub skip_backoff: Duration,
    pub error_backoff: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            schedule_recheck: SCHEDULE_RECHECK_INTERVAL,
            schedule_exit_poll: SCHEDULE_EXIT_POLL_INTERVAL,
            skip_backoff: SKIP_BACKOFF,
            error_backoff: ERROR_BACKOFF,
        }
    }
}

/// Sequencer construction settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerSettings {
    pub timing: Timing,
    pub player: PlayerConfig,
}

/// Work the sequencer hands to its driver
#[derive(Debug, Clone)]
pub enum Effect {
    /// Call `fire_timer(id)` after `delay`
    ArmTimer { id: TimerId, delay: Duration },
    /// Drop a previously armed timer
    CancelTimer(TimerId),
    /// Publish on the event bus
    Publish(VloopEvent),
}

/// Which presentation controls are currently usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub add_entry: bool,
    pub remove_entry: bool,
    pub edit_entry: bool,
    pub toggle_schedule: bool,
    pub edit_schedule: bool,
    pub start: bool,
    pub stop: bool,
}

/// Read-only view of the sequencer for presentation
#[derive(Debug, Clone, Serialize)]
pub struct SequencerSnapshot {
    pub state: PlaybackState,
    pub status: String,
    pub current_entry_id: Option<EntryId>,
    pub current_valid_index: usize,
    pub loops_completed: u32,
    pub schedule_enabled: bool,
    pub runtime_ready: bool,
    pub entries: Vec<MediaEntry>,
    pub windows: Vec<ScheduleWindow>,
    pub controls: Controls,
}

/// The playback sequencer
pub struct Sequencer {
    entries: EntryList,
    schedule: Schedule,
    bindings: BindingMap,
    factory: Box<dyn PlayerFactory>,
    clock: Arc<dyn Clock>,
    settings: SequencerSettings,
    machine: StateMachine,
    runtime_ready: bool,
    current_entry: Option<EntryId>,
    current_valid_index: usize,
    loops_completed: u32,
    /// Entry whose player was not ready when it came up; a late `Ready`
    /// for it resumes playback instead of waiting for the skip
    awaiting_ready: Option<EntryId>,
    timers: TimerSet,
    status: String,
    effects: Vec<Effect>,
}

impl Sequencer {
    /// Create a sequencer over `entries`
    ///
    /// An empty list is seeded with one blank entry, like a fresh form.
    pub fn new(
        mut entries: EntryList,
        schedule: Schedule,
        factory: Box<dyn PlayerFactory>,
        clock: Arc<dyn Clock>,
        settings: SequencerSettings,
    ) -> Self {
        if entries.is_empty() {
            entries.add(MediaEntry::blank());
        }

        Self {
            entries,
            schedule,
            bindings: BindingMap::new(),
            factory,
            clock,
            settings,
            machine: StateMachine::new(),
            runtime_ready: false,
            current_entry: None,
            current_valid_index: 0,
            loops_completed: 0,
            awaiting_ready: None,
            timers: TimerSet::new(),
            status: STATUS_READY.to_string(),
            effects: Vec::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    /// A run is in progress
    pub fn is_playing(&self) -> bool {
        self.machine.state().is_running()
    }

    pub fn current_entry_id(&self) -> Option<EntryId> {
        self.current_entry
    }

    pub fn current_valid_index(&self) -> usize {
        self.current_valid_index
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn entries(&self) -> &EntryList {
        &self.entries
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_runtime_ready(&self) -> bool {
        self.runtime_ready
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn handle_for(&self, id: EntryId) -> Option<PlayerHandle> {
        self.bindings.handle_for(id)
    }

    pub fn is_player_ready(&self, id: EntryId) -> bool {
        self.bindings.is_ready(id)
    }

    pub fn armed_timers(&self) -> Vec<ArmedTimer> {
        self.timers.armed()
    }

    /// Control availability: list and schedule editing are locked during a run
    pub fn controls(&self) -> Controls {
        let running = self.is_playing();
        let waiting = self.state() == PlaybackState::WaitingForSchedule;
        Controls {
            add_entry: !running,
            remove_entry: !running,
            edit_entry: !running,
            toggle_schedule: !running,
            edit_schedule: !running && self.schedule.enabled(),
            start: !running && self.entries.valid_count() > 0,
            stop: running || waiting,
        }
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            state: self.state(),
            status: self.status.clone(),
            current_entry_id: self.current_entry,
            current_valid_index: self.current_valid_index,
            loops_completed: self.loops_completed,
            schedule_enabled: self.schedule.enabled(),
            runtime_ready: self.runtime_ready,
            entries: self.entries.to_vec(),
            windows: self.schedule.windows().to_vec(),
            controls: self.controls(),
        }
    }

    /// Drain queued effects
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ========================================================================
    // List and schedule intents
    // ========================================================================

    /// The player runtime became available; create players for every entry
    pub fn runtime_ready(&mut self) {
        if self.runtime_ready {
            return;
        }
        info!("Player runtime ready");
        self.runtime_ready = true;
        self.reconcile();
    }

    /// Append an entry; never disturbs a run in progress
    pub fn add_entry(&mut self, entry: MediaEntry) -> EntryId {
        let id = self.entries.add(entry);
        info!("Added entry {}", uuid_utils::short(&id));
        self.reconcile();
        self.reanchor();
        id
    }

    /// Append a blank entry
    pub fn add_blank_entry(&mut self) -> EntryId {
        self.add_entry(MediaEntry::blank())
    }

    /// Remove an entry and release its player
    ///
    /// Removing the entry that is playing stops the run first.
    pub fn remove_entry(&mut self, id: EntryId) -> Result<()> {
        if !self.entries.contains(id) {
            return Err(Error::EntryNotFound(id));
        }

        if self.current_entry == Some(id) {
            self.stop_with(STATUS_REMOVED);
        }

        self.entries.remove(id);
        self.bindings.release(id);
        if self.awaiting_ready == Some(id) {
            self.awaiting_ready = None;
        }
        info!("Removed entry {}", uuid_utils::short(&id));

        if self.is_playing() {
            self.reanchor();
        }
        Ok(())
    }

    /// Edit one field of an entry
    ///
    /// Edits to other entries during a run are applied without touching
    /// playback; editing the entry that is playing is rejected.
    pub fn edit_entry(&mut self, id: EntryId, field: EntryField, value: &str) -> Result<()> {
        if self.is_playing() && self.current_entry == Some(id) {
            return Err(Error::InvalidState(
                "cannot edit the entry that is playing".to_string(),
            ));
        }
        self.entries.edit(id, field, value)?;
        debug!("Edited {:?} of entry {}", field, id);

        if self.is_playing() {
            self.reanchor();
        }
        Ok(())
    }

    /// Flip the schedule flag, returning the new value
    pub fn toggle_schedule(&mut self) -> bool {
        let enabled = !self.schedule.enabled();
        self.set_schedule_enabled(enabled);
        enabled
    }

    /// Enable or disable schedule gating
    ///
    /// During a run this arms or disarms the exit poll. While waiting for a
    /// window, disabling the schedule starts immediately.
    pub fn set_schedule_enabled(&mut self, enabled: bool) {
        self.schedule.set_enabled(enabled);
        info!("Schedule {}", if enabled { "enabled" } else { "disabled" });

        if self.is_playing() {
            if enabled {
                self.arm_exit_poll();
            } else {
                self.cancel_timers(|k| *k == TimerKind::ScheduleExitPoll);
            }
        } else if !enabled && self.state() == PlaybackState::WaitingForSchedule {
            self.start();
        }
    }

    /// Edit one end of a schedule window (`HH:MM`, or empty to clear)
    pub fn edit_schedule_window(
        &mut self,
        id: usize,
        field: WindowField,
        value: &str,
    ) -> Result<()> {
        self.schedule.edit_window(id, field, value)?;
        debug!("Schedule window now {}", self.schedule.windows()[id]);
        Ok(())
    }

    // ========================================================================
    // Run control
    // ========================================================================

    /// Begin a run from the first valid entry, if the schedule allows
    pub fn start(&mut self) {
        if !self.state().can_start() {
            debug!("Start ignored in state {}", self.state());
            return;
        }

        if !self.schedule.is_within(self.clock.local_time()) {
            self.enter(PlaybackState::WaitingForSchedule);
            self.set_status(STATUS_WAITING);
            if !self.timers.has(TimerKind::ScheduleRecheck) {
                self.arm(TimerKind::ScheduleRecheck, self.settings.timing.schedule_recheck);
            }
            return;
        }

        self.cancel_timers(|k| *k == TimerKind::ScheduleRecheck);
        self.current_valid_index = 0;
        self.loops_completed = 0;
        self.enter(PlaybackState::Loading);
        info!("Starting playback");

        if self.schedule.enabled() {
            self.arm_exit_poll();
        }
        self.play_current();
    }

    /// Stop with the default status
    pub fn stop(&mut self) {
        self.stop_with(STATUS_STOPPED);
    }

    /// Stop the run, cancel every timer and report `message`
    pub fn stop_with(&mut self, message: &str) {
        if let Some(id) = self.current_entry.take() {
            if let Some(binding) = self.bindings.get_mut(id) {
                binding.adapter.stop_video();
            }
        }
        self.current_valid_index = 0;
        self.loops_completed = 0;
        self.awaiting_ready = None;
        for id in self.timers.cancel_all() {
            self.effects.push(Effect::CancelTimer(id));
        }
        self.enter(PlaybackState::Stopped);
        self.set_status(message);
    }

    // ========================================================================
    // Adapter events and timers
    // ========================================================================

    /// Apply one adapter event
    ///
    /// Events from players that are not bound to the current entry are
    /// dropped, except `Ready`, which updates whichever binding owns the
    /// handle.
    pub fn handle_adapter_event(&mut self, event: AdapterEvent) {
        match event.kind {
            AdapterEventKind::Ready => self.on_ready(event.handle),
            AdapterEventKind::StateChange(state) => {
                if let Some(id) = self.current_for(event.handle) {
                    self.on_state_change(id, state);
                }
            }
            AdapterEventKind::Error(code) => {
                if let Some(id) = self.current_for(event.handle) {
                    self.on_error(id, code);
                }
            }
        }
    }

    /// A timer armed earlier has elapsed
    pub fn fire_timer(&mut self, id: TimerId) {
        let Some(kind) = self.timers.take_fired(id) else {
            debug!("Ignoring stale {}", id);
            return;
        };

        match kind {
            TimerKind::ScheduleRecheck => {
                if self.state() == PlaybackState::WaitingForSchedule {
                    self.start();
                }
            }
            TimerKind::ScheduleExitPoll => {
                if !self.is_playing() {
                    return;
                }
                if self.schedule.is_within(self.clock.local_time()) {
                    self.arm_exit_poll();
                } else {
                    self.stop_with(STATUS_SCHEDULED_STOP);
                }
            }
            TimerKind::Advance(cause) => {
                if self.is_playing() {
                    debug!("Advancing ({:?})", cause);
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn on_ready(&mut self, handle: PlayerHandle) {
        let Some(id) = self.bindings.mark_ready(handle) else {
            debug!("Ready from unbound {}, ignoring", handle);
            return;
        };
        debug!("{} ready for entry {}", handle, id);

        if self.is_playing()
            && self.awaiting_ready == Some(id)
            && self.current_entry == Some(id)
        {
            info!("Player for entry {} became ready, resuming", id);
            self.play_current();
        }
    }

    fn on_state_change(&mut self, id: EntryId, state: PlayerState) {
        let Some(entry) = self.entries.get(id).cloned() else {
            return;
        };

        match state {
            PlayerState::Ended => {
                if self.timers.has_advance() {
                    debug!("Entry {} already advancing, ignoring Ended", id);
                    return;
                }
                let loop_again = entry
                    .max_loops()
                    .map_or(true, |max| self.loops_completed + 1 < max);

                if loop_again {
                    self.loops_completed += 1;
                    debug!("Entry {} loop {} starting", id, self.loops_completed + 1);
                    if let Some(binding) = self.bindings.get_mut(id) {
                        binding.adapter.play_video();
                    }
                    return;
                }

                self.set_status(&format!(
                    "Finished playing. Delaying for {}s...",
                    entry.delay_seconds
                ));
                self.publish(VloopEvent::EntryFinished {
                    entry_id: id,
                    loops_played: self.loops_completed + 1,
                    delay_seconds: entry.delay_seconds,
                    timestamp: vloop_common::time::now(),
                });

                if entry.delay_seconds == 0 {
                    self.advance();
                } else {
                    self.arm(
                        TimerKind::Advance(AdvanceCause::Finished),
                        Duration::from_secs(u64::from(entry.delay_seconds)),
                    );
                }
            }
            PlayerState::Playing => {
                let title = self
                    .bindings
                    .get(id)
                    .and_then(|b| b.adapter.video_data().title)
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| entry.url.clone());
                self.enter(PlaybackState::Playing);
                self.set_status(&format!("Playing: {}", title));
            }
            PlayerState::Paused => {
                self.enter(PlaybackState::Paused);
                self.set_status(STATUS_PAUSED);
            }
            other => debug!("Entry {} player state {:?}", id, other),
        }
    }

    fn on_error(&mut self, id: EntryId, code: i32) {
        warn!("Player error {} on entry {}", code, id);
        self.skip(
            id,
            SkipReason::AdapterPlaybackError,
            STATUS_PLAYER_ERROR.to_string(),
        );
    }

    /// Entry for `handle` if it is the current entry of a running sequence
    fn current_for(&self, handle: PlayerHandle) -> Option<EntryId> {
        let id = self.bindings.entry_for(handle);
        if id.is_some() && id == self.current_entry && self.is_playing() {
            id
        } else {
            debug!("Discarding event from non-current {}", handle);
            None
        }
    }

    /// End the run because nothing playable is listed
    fn halt_empty(&mut self, message: &str) {
        warn!("Halting run: {}", SkipReason::EmptyList);
        self.stop_with(message);
    }

    /// Next valid entry, cyclically, with a fresh loop counter
    fn advance(&mut self) {
        let count = self.entries.valid_count();
        if count == 0 {
            self.halt_empty(STATUS_NO_VALID_IN_LIST);
            return;
        }
        self.current_valid_index = (self.current_valid_index + 1) % count;
        self.loops_completed = 0;
        self.play_current();
    }

    /// Load the valid entry at the current index, or schedule a skip
    fn play_current(&mut self) {
        self.cancel_timers(TimerKind::is_advance);
        self.awaiting_ready = None;

        let count = self.entries.valid_count();
        if count == 0 {
            self.halt_empty(STATUS_NO_VALID_TO_PLAY);
            return;
        }
        self.current_valid_index %= count;

        let Some(entry) = self.entries.valid_at(self.current_valid_index).cloned() else {
            self.halt_empty(STATUS_NO_VALID_TO_PLAY);
            return;
        };
        self.current_entry = Some(entry.id);
        self.enter(PlaybackState::Loading);

        let ids = match url_resolver::resolve(&entry.url) {
            Ok(ids) if ids.is_playable() => ids,
            Ok(_) => {
                self.skip_invalid_url(&entry);
                return;
            }
            Err(e) => {
                debug!("Entry {} URL rejected: {}", entry.id, e);
                self.skip_invalid_url(&entry);
                return;
            }
        };

        if !self.bindings.is_ready(entry.id) {
            self.awaiting_ready = Some(entry.id);
            self.skip(
                entry.id,
                SkipReason::AdapterNotReady,
                format!("Player for {} not ready. Skipping.", entry.url),
            );
            return;
        }

        self.set_status(&format!("Loading: {}", entry.url));
        self.publish(VloopEvent::EntryLoading {
            entry_id: entry.id,
            url: entry.url.clone(),
            timestamp: vloop_common::time::now(),
        });

        let suggested_quality = self.settings.player.suggested_quality.clone();
        if let Some(binding) = self.bindings.get_mut(entry.id) {
            match (ids.playlist_id, ids.video_id) {
                (Some(list_id), _) => binding.adapter.load_playlist(&PlaylistRequest {
                    list_id,
                    start_index: 0,
                    suggested_quality,
                }),
                (None, Some(video_id)) => binding.adapter.load_video_by_id(&video_id),
                (None, None) => {}
            }
        }
    }

    fn skip_invalid_url(&mut self, entry: &MediaEntry) {
        self.skip(
            entry.id,
            SkipReason::InvalidUrl,
            format!("Invalid URL: {}. Skipping.", entry.url),
        );
    }

    fn skip(&mut self, id: EntryId, reason: SkipReason, message: String) {
        debug_assert!(!reason.halts_run());
        warn!("Skipping entry {}: {}", id, reason);
        self.set_status(&message);
        self.publish(VloopEvent::EntrySkipped {
            entry_id: id,
            reason,
            timestamp: vloop_common::time::now(),
        });
        let delay = match reason {
            SkipReason::AdapterPlaybackError => self.settings.timing.error_backoff,
            _ => self.settings.timing.skip_backoff,
        };
        self.arm(TimerKind::Advance(AdvanceCause::Skip(reason)), delay);
    }

    /// Keep the index pointing at the current entry after list changes
    fn reanchor(&mut self) {
        if let Some(id) = self.current_entry {
            if let Some(position) = self.entries.valid_position(id) {
                self.current_valid_index = position;
            }
        }
    }

    fn reconcile(&mut self) {
        if !self.runtime_ready {
            return;
        }
        let report = self
            .bindings
            .reconcile(&self.entries, self.factory.as_mut(), &self.settings.player);
        if !report.created.is_empty() || !report.destroyed.is_empty() {
            debug!(
                "Reconciled players: {} created, {} destroyed",
                report.created.len(),
                report.destroyed.len()
            );
        }
    }

    fn arm_exit_poll(&mut self) {
        if !self.timers.has(TimerKind::ScheduleExitPoll) {
            self.arm(TimerKind::ScheduleExitPoll, self.settings.timing.schedule_exit_poll);
        }
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        let id = self.timers.arm(kind, delay);
        debug!("Armed {} ({:?}) for {:?}", id, kind, delay);
        self.effects.push(Effect::ArmTimer { id, delay });
    }

    fn cancel_timers(&mut self, pred: impl Fn(&TimerKind) -> bool) {
        for id in self.timers.cancel_where(pred) {
            self.effects.push(Effect::CancelTimer(id));
        }
    }

    fn enter(&mut self, to: PlaybackState) {
        match self.machine.transition(to) {
            Ok(Some(from)) => self.publish(VloopEvent::PlaybackStateChanged {
                old_state: from,
                new_state: to,
                timestamp: vloop_common::time::now(),
            }),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }

    fn set_status(&mut self, message: &str) {
        info!("{}", message);
        self.status = message.to_string();
        self.publish(VloopEvent::status(message));
    }

    fn publish(&mut self, event: VloopEvent) {
        self.effects.push(Effect::Publish(event));
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.bindings.release_all();
    }
}
