//! Shared fixtures for vloop-seq integration tests
//!
//! `Rig` wraps a sequencer wired to a recording player factory and a fixed
//! clock, with shortcuts for delivering adapter events and firing timers.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveTime;
use vloop_common::FixedClock;
use vloop_seq::playback::entries::{EntryId, EntryList, MediaEntry};
use vloop_seq::playback::timers::{ArmedTimer, TimerKind};
use vloop_seq::playback::{Sequencer, SequencerSettings};
use vloop_seq::player::{
    AdapterEvent, PlayerCommand, PlayerHandle, PlayerState, RecordingPlayerFactory,
};
use vloop_seq::schedule::Schedule;

pub struct Rig {
    pub seq: Sequencer,
    pub players: RecordingPlayerFactory,
    pub clock: FixedClock,
}

impl Rig {
    /// Sequencer over `entries` at 12:00 with the runtime already available
    pub fn new(entries: Vec<MediaEntry>) -> Self {
        Self::with_schedule(entries, Schedule::new())
    }

    pub fn with_schedule(entries: Vec<MediaEntry>, schedule: Schedule) -> Self {
        let players = RecordingPlayerFactory::new();
        let clock = FixedClock::at(12, 0);
        let mut seq = Sequencer::new(
            EntryList::from_entries(entries),
            schedule,
            Box::new(players.clone()),
            Arc::new(clock.clone()),
            SequencerSettings::default(),
        );
        seq.runtime_ready();
        Self {
            seq,
            players,
            clock,
        }
    }

    pub fn handle(&self, id: EntryId) -> PlayerHandle {
        self.seq
            .handle_for(id)
            .unwrap_or_else(|| panic!("entry {} has no player", id))
    }

    pub fn ready(&mut self, id: EntryId) {
        let handle = self.handle(id);
        self.seq.handle_adapter_event(AdapterEvent::ready(handle));
    }

    pub fn ready_all(&mut self) {
        for id in self.seq.entries().ids() {
            self.ready(id);
        }
    }

    pub fn send_state(&mut self, id: EntryId, state: PlayerState) {
        let handle = self.handle(id);
        self.seq.handle_adapter_event(AdapterEvent::state(handle, state));
    }

    pub fn send_error(&mut self, id: EntryId, code: i32) {
        let handle = self.handle(id);
        self.seq.handle_adapter_event(AdapterEvent::error(handle, code));
    }

    /// Play the current entry through to its last `Ended`
    pub fn finish_current(&mut self) {
        let id = self.seq.current_entry_id().expect("nothing is playing");
        let loops = self.seq.entries().get(id).map(|e| e.loop_count).unwrap_or(1);
        for _ in 0..loops.max(1) {
            self.send_state(id, PlayerState::Ended);
        }
    }

    pub fn timer(&self, kind: TimerKind) -> Option<ArmedTimer> {
        self.seq.armed_timers().into_iter().find(|t| t.kind == kind)
    }

    pub fn advance_timer(&self) -> Option<ArmedTimer> {
        self.seq
            .armed_timers()
            .into_iter()
            .find(|t| t.kind.is_advance())
    }

    pub fn fire(&mut self, kind: TimerKind) {
        let timer = self
            .timer(kind)
            .unwrap_or_else(|| panic!("no {:?} timer armed", kind));
        self.seq.fire_timer(timer.id);
    }

    pub fn fire_advance(&mut self) {
        let timer = self.advance_timer().expect("no advance timer armed");
        self.seq.fire_timer(timer.id);
    }

    pub fn set_time(&self, hour: u32, minute: u32) {
        self.clock
            .set(NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"));
    }

    /// Video ids loaded so far, in order, across all players
    pub fn loaded_videos(&self) -> Vec<String> {
        self.players
            .commands()
            .into_iter()
            .filter_map(|(_, c)| match c {
                PlayerCommand::LoadVideo(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

pub fn video(id: &str, loop_count: u32, delay_seconds: u32) -> MediaEntry {
    MediaEntry::new(
        format!("https://www.youtube.com/watch?v={}", id),
        loop_count,
        delay_seconds,
    )
}
