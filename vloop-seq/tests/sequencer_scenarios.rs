//! Playlist scenarios driven through the synchronous sequencer
//!
//! Each test scripts adapter events and timer firings by hand, so ordering is
//! exact and no tokio runtime is involved.

mod helpers;

use helpers::{video, Rig};
use vloop_seq::playback::entries::{EntryField, MediaEntry};
use vloop_seq::playback::sequencer::{
    STATUS_NO_VALID_IN_LIST, STATUS_REMOVED, STATUS_SCHEDULED_STOP, STATUS_STOPPED,
    STATUS_WAITING,
};
use vloop_seq::playback::timers::{AdvanceCause, TimerKind};
use vloop_seq::playback::PlaybackState;
use vloop_seq::player::{PlayerCommand, PlayerState};
use vloop_seq::schedule::{Schedule, WindowField};

#[test]
fn cycles_through_valid_entries_in_order() {
    let mut rig = Rig::new(vec![
        video("v0", 1, 0),
        MediaEntry::blank(),
        video("v1", 2, 0),
        video("v2", 1, 0),
    ]);
    rig.ready_all();
    rig.seq.start();

    for _ in 0..7 {
        rig.finish_current();
    }

    assert_eq!(
        rig.loaded_videos(),
        vec!["v0", "v1", "v2", "v0", "v1", "v2", "v0", "v1"]
    );
}

#[test]
fn single_entry_wraps_to_itself() {
    let a = video("solo", 1, 0);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a]);
    rig.ready_all();
    rig.seq.start();

    rig.finish_current();
    rig.finish_current();
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
    assert_eq!(rig.seq.current_valid_index(), 0);
    assert_eq!(rig.loaded_videos(), vec!["solo", "solo", "solo"]);
}

#[test]
fn loop_count_controls_replays() {
    let a = video("a", 3, 0);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a, video("b", 1, 0)]);
    rig.ready_all();
    rig.seq.start();
    let handle = rig.handle(a_id);

    rig.send_state(a_id, PlayerState::Ended);
    rig.send_state(a_id, PlayerState::Ended);
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
    assert_eq!(rig.seq.loops_completed(), 2);

    rig.send_state(a_id, PlayerState::Ended);
    assert_ne!(rig.seq.current_entry_id(), Some(a_id));

    let plays = rig
        .players
        .commands_for(handle)
        .into_iter()
        .filter(|c| *c == PlayerCommand::Play)
        .count();
    assert_eq!(plays, 2);
}

/// A loops forever and B is never reached; only stop ends the run
#[test]
fn infinite_entry_holds_the_run() {
    let a = video("A", 0, 5);
    let b = video("B", 2, 0);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    rig.seq.start();

    for _ in 0..100 {
        rig.send_state(a_id, PlayerState::Ended);
    }
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
    assert!(rig.advance_timer().is_none());
    assert!(!rig.seq.status().starts_with("Finished playing"));
    assert_eq!(rig.loaded_videos(), vec!["A"]);

    rig.seq.stop();
    assert_eq!(rig.seq.status(), STATUS_STOPPED);
    assert!(!rig.seq.is_playing());
}

#[test]
fn infinite_entry_ends_on_removal() {
    let a = video("A", 0, 5);
    let b = video("B", 2, 0);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    rig.seq.start();
    rig.send_state(a_id, PlayerState::Ended);

    rig.seq.remove_entry(a_id).unwrap();
    assert_eq!(rig.seq.status(), STATUS_REMOVED);
    assert!(rig.seq.status().contains("removed"));
    assert_eq!(rig.seq.current_entry_id(), None);
    assert_eq!(rig.seq.state(), PlaybackState::Stopped);
    assert!(rig.seq.handle_for(a_id).is_none());
}

#[test]
fn delay_is_armed_with_entry_seconds() {
    let a = video("a", 1, 12);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a, video("b", 1, 0)]);
    rig.ready_all();
    rig.seq.start();

    rig.send_state(a_id, PlayerState::Ended);
    assert_eq!(rig.seq.status(), "Finished playing. Delaying for 12s...");
    let timer = rig
        .timer(TimerKind::Advance(AdvanceCause::Finished))
        .unwrap();
    assert_eq!(timer.delay.as_secs(), 12);

    // Events arriving during the delay do not move the sequence
    rig.send_state(a_id, PlayerState::Ended);
    assert_eq!(rig.seq.armed_timers().len(), 1);

    rig.fire_advance();
    assert_eq!(rig.loaded_videos(), vec!["a", "b"]);
}

#[test]
fn player_error_advances_and_keeps_entry() {
    let a = video("broken", 0, 0);
    let b = video("fine", 1, 0);
    let (a_id, b_id) = (a.id, b.id);
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    rig.seq.start();

    rig.send_error(a_id, 150);
    assert_eq!(rig.seq.status(), "Error playing video. Skipping.");
    let timer = rig.advance_timer().unwrap();
    assert_eq!(timer.delay.as_secs(), 3);

    rig.fire_advance();
    assert_eq!(rig.seq.current_entry_id(), Some(b_id));
    assert!(rig.seq.entries().contains(a_id));

    // Wraps back to the failing entry and tries it again
    rig.finish_current();
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
}

#[test]
fn all_invalid_urls_keep_skipping() {
    let mut rig = Rig::new(vec![
        MediaEntry::new("not a url", 1, 0),
        MediaEntry::new("https://example.com/", 1, 0),
    ]);
    rig.ready_all();
    rig.seq.start();

    for _ in 0..5 {
        assert!(rig.seq.status().starts_with("Invalid URL: "));
        assert!(rig.seq.is_playing());
        rig.fire_advance();
    }
    assert!(rig.players.commands().iter().all(|(_, c)| !matches!(
        c,
        PlayerCommand::LoadVideo(_) | PlayerCommand::LoadPlaylist(_)
    )));
}

#[test]
fn whitespace_url_is_listed_and_skipped() {
    let blank_ish = MediaEntry::new("   ", 1, 0);
    let blank_id = blank_ish.id;
    let mut rig = Rig::new(vec![blank_ish]);
    rig.ready_all();
    assert!(rig.seq.controls().start);

    rig.seq.start();
    assert!(rig.seq.is_playing());
    assert_eq!(rig.seq.current_entry_id(), Some(blank_id));
    assert_eq!(rig.seq.status(), "Invalid URL:    . Skipping.");
    assert_eq!(rig.advance_timer().unwrap().delay.as_secs(), 2);

    rig.fire_advance();
    assert!(rig.seq.is_playing());
    assert!(rig.seq.status().starts_with("Invalid URL: "));
}

#[test]
fn whitespace_url_keeps_its_turn_in_rotation() {
    let a = video("a", 1, 0);
    let spaces = MediaEntry::new(" ", 1, 0);
    let (a_id, spaces_id) = (a.id, spaces.id);
    let mut rig = Rig::new(vec![a, spaces]);
    rig.ready_all();
    rig.seq.start();

    rig.send_state(a_id, PlayerState::Ended);
    assert_eq!(rig.seq.current_entry_id(), Some(spaces_id));
    assert_eq!(rig.seq.current_valid_index(), 1);

    rig.fire_advance();
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
    assert_eq!(rig.loaded_videos(), vec!["a", "a"]);
}

#[test]
fn clearing_last_url_halts_the_run() {
    let a = video("a", 1, 0);
    let b = video("b", 1, 10);
    let (a_id, b_id) = (a.id, b.id);
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    rig.seq.start();

    rig.seq.edit_entry(b_id, EntryField::Url, "").unwrap();
    rig.seq.remove_entry(a_id).unwrap();
    assert_eq!(rig.seq.status(), STATUS_REMOVED);

    // Fresh start with nothing playable
    rig.seq.start();
    assert_eq!(rig.seq.state(), PlaybackState::Stopped);
    assert_eq!(rig.seq.status(), "No valid videos to play.");
}

#[test]
fn removing_last_valid_other_entry_during_delay() {
    let a = video("a", 1, 10);
    let b = video("b", 1, 0);
    let (a_id, b_id) = (a.id, b.id);
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    rig.seq.start();
    rig.send_state(a_id, PlayerState::Ended);

    rig.seq.remove_entry(b_id).unwrap();
    assert!(rig.seq.is_playing());

    rig.seq.edit_entry(b_id, EntryField::Url, "x").unwrap_err();
    rig.fire_advance();
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));
    assert_eq!(rig.seq.status(), "Loading: https://www.youtube.com/watch?v=a");
    assert_ne!(rig.seq.status(), STATUS_NO_VALID_IN_LIST);
}

#[test]
fn schedule_gates_start_and_stops_on_exit() {
    let mut schedule = Schedule::new();
    schedule.set_enabled(true);
    schedule.edit_window(0, WindowField::Start, "09:00").unwrap();
    schedule.edit_window(0, WindowField::Stop, "17:00").unwrap();

    let mut rig = Rig::with_schedule(vec![video("a", 0, 0)], schedule);
    rig.ready_all();
    rig.set_time(8, 0);

    rig.seq.start();
    assert_eq!(rig.seq.state(), PlaybackState::WaitingForSchedule);
    assert_eq!(rig.seq.status(), STATUS_WAITING);
    assert_eq!(
        rig.timer(TimerKind::ScheduleRecheck).unwrap().delay.as_secs(),
        60
    );
    assert!(rig
        .players
        .commands()
        .iter()
        .all(|(_, c)| !matches!(c, PlayerCommand::LoadVideo(_))));

    rig.set_time(9, 0);
    rig.fire(TimerKind::ScheduleRecheck);
    assert!(rig.seq.is_playing());
    assert_eq!(
        rig.timer(TimerKind::ScheduleExitPoll).unwrap().delay.as_secs(),
        30
    );

    rig.set_time(16, 59);
    rig.fire(TimerKind::ScheduleExitPoll);
    assert!(rig.seq.is_playing());

    rig.set_time(17, 0);
    rig.fire(TimerKind::ScheduleExitPoll);
    assert_eq!(rig.seq.status(), STATUS_SCHEDULED_STOP);
    assert!(rig.seq.armed_timers().is_empty());
}

#[test]
fn wrapping_window_allows_overnight_start() {
    let mut schedule = Schedule::new();
    schedule.set_enabled(true);
    schedule.edit_window(2, WindowField::Start, "22:00").unwrap();
    schedule.edit_window(2, WindowField::Stop, "02:00").unwrap();

    let mut rig = Rig::with_schedule(vec![video("night", 1, 0)], schedule);
    rig.ready_all();
    rig.set_time(1, 0);
    rig.seq.start();
    assert!(rig.seq.is_playing());
}

#[test]
fn enabling_schedule_mid_run_arms_exit_poll() {
    let mut rig = Rig::new(vec![video("a", 0, 0)]);
    rig.ready_all();
    rig.seq.start();
    assert!(rig.timer(TimerKind::ScheduleExitPoll).is_none());

    rig.seq.set_schedule_enabled(true);
    assert!(rig.timer(TimerKind::ScheduleExitPoll).is_some());

    // No window configured: the next poll stops the run
    rig.fire(TimerKind::ScheduleExitPoll);
    assert_eq!(rig.seq.status(), STATUS_SCHEDULED_STOP);

    rig.seq.set_schedule_enabled(false);
    assert!(rig.seq.armed_timers().is_empty());
}

#[test]
fn stale_events_after_removal_are_ignored() {
    let a = video("a", 1, 0);
    let b = video("b", 0, 0);
    let (a_id, b_id) = (a.id, b.id);
    let mut rig = Rig::new(vec![a, b]);
    rig.ready_all();
    let old_handle = rig.handle(a_id);
    rig.seq.remove_entry(a_id).unwrap();

    rig.seq.start();
    assert_eq!(rig.seq.current_entry_id(), Some(b_id));
    let status = rig.seq.status().to_string();

    rig.seq.handle_adapter_event(vloop_seq::player::AdapterEvent::state(
        old_handle,
        PlayerState::Ended,
    ));
    rig.seq
        .handle_adapter_event(vloop_seq::player::AdapterEvent::error(old_handle, 2));
    assert_eq!(rig.seq.status(), status);
    assert!(rig.advance_timer().is_none());
}

#[test]
fn added_entry_joins_rotation() {
    let a = video("a", 1, 0);
    let a_id = a.id;
    let mut rig = Rig::new(vec![a]);
    rig.ready_all();
    rig.seq.start();

    let b_id = rig.seq.add_entry(video("b", 1, 0));
    rig.ready(b_id);
    assert_eq!(rig.seq.current_entry_id(), Some(a_id));

    rig.finish_current();
    assert_eq!(rig.seq.current_entry_id(), Some(b_id));
}
