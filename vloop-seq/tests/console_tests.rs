//! Console scripts applied through a live engine

use std::sync::Arc;

use chrono::NaiveTime;
use vloop_common::events::EventBus;
use vloop_common::FixedClock;
use vloop_seq::console::{self, Command, Outcome};
use vloop_seq::playback::entries::EntryList;
use vloop_seq::playback::{self, EngineHandle, PlaybackEngine, Sequencer, SequencerSettings};
use vloop_seq::player::RecordingPlayerFactory;
use vloop_seq::schedule::Schedule;
use vloop_seq::Error;

fn launch() -> (EngineHandle, tokio::task::JoinHandle<()>) {
    let (handle, inbox) = playback::channel();
    let sequencer = Sequencer::new(
        EntryList::new(),
        Schedule::new(),
        Box::new(RecordingPlayerFactory::new()),
        Arc::new(FixedClock::at(12, 0)),
        SequencerSettings::default(),
    );
    let task = tokio::spawn(PlaybackEngine::new(sequencer, inbox, EventBus::new(64)).run());
    (handle, task)
}

#[tokio::test]
async fn script_builds_list_and_schedule() {
    let (handle, task) = launch();
    let script = "\
# fill in the blank first row, then add one more
edit 1 url https://youtu.be/first
add https://youtu.be/second 2 15
window 1 start 08:00
schedule on
window 1 start 08:00
window 1 stop 18:30
bogus command
list
";
    console::run(&handle, script.as_bytes()).await.unwrap();

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.entries.len(), 2);
    assert_eq!(snap.entries[0].url, "https://youtu.be/first");
    assert_eq!(snap.entries[1].loop_count, 2);
    assert_eq!(snap.entries[1].delay_seconds, 15);
    assert!(snap.schedule_enabled);
    assert_eq!(snap.windows[0].start, NaiveTime::from_hms_opt(8, 0, 0));
    assert_eq!(snap.windows[0].stop, NaiveTime::from_hms_opt(18, 30, 0));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn list_edits_refused_while_running() {
    let (handle, task) = launch();
    handle.runtime_ready().unwrap();
    console::run(&handle, "edit 1 url https://youtu.be/x\nstart\n".as_bytes())
        .await
        .unwrap();
    assert!(handle.snapshot().await.unwrap().state.is_running());

    let refused = console::execute(
        &handle,
        console::parse("add https://youtu.be/y").unwrap().unwrap(),
    )
    .await;
    assert!(matches!(refused, Err(Error::InvalidState(_))));

    let outcome = console::execute(&handle, Command::Stop).await.unwrap();
    assert_eq!(outcome, Outcome::Continue(vec![]));
    let outcome = console::execute(&handle, Command::Status).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Continue(vec!["state: stopped".into(), "status: Stopped.".into()])
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn quit_ends_the_script_early() {
    let (handle, task) = launch();
    console::run(&handle, "quit\nadd https://youtu.be/never\n".as_bytes())
        .await
        .unwrap();
    assert_eq!(handle.snapshot().await.unwrap().entries.len(), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
