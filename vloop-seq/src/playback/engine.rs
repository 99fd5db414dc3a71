//! Playback engine task
//!
//! Owns the [`Sequencer`] and serializes everything that touches it: user
//! intents, adapter events and timer firings all arrive on one unbounded
//! channel and are applied in arrival order. After each message the engine
//! drains the sequencer's effects, turning timer requests into tokio sleeps
//! and publishing events on the [`EventBus`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, info};
use vloop_common::events::EventBus;

use super::entries::{EntryField, EntryId, MediaEntry};
use super::sequencer::{Effect, Sequencer, SequencerSnapshot};
use super::timers::TimerId;
use crate::error::{Error, Result};
use crate::player::{AdapterEvent, AdapterEventSink};
use crate::schedule::WindowField;

/// A user intent, with a reply channel where the caller wants an answer
#[derive(Debug)]
pub enum Request {
    RuntimeReady,
    AddEntry {
        entry: MediaEntry,
        reply: oneshot::Sender<EntryId>,
    },
    RemoveEntry {
        id: EntryId,
        reply: oneshot::Sender<Result<()>>,
    },
    EditEntry {
        id: EntryId,
        field: EntryField,
        value: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ToggleSchedule {
        reply: oneshot::Sender<bool>,
    },
    SetScheduleEnabled {
        enabled: bool,
    },
    EditScheduleWindow {
        id: usize,
        field: WindowField,
        value: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Start,
    Stop,
    Snapshot {
        reply: oneshot::Sender<SequencerSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Everything the engine reacts to
#[derive(Debug)]
pub enum EngineMessage {
    Request(Request),
    Adapter(AdapterEvent),
    TimerFired(TimerId),
}

/// Create the engine channel
pub fn channel() -> (EngineHandle, EngineInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineHandle { tx: tx.clone() }, EngineInbox { tx, rx })
}

/// Receiving side of the engine channel, consumed by [`PlaybackEngine::new`]
pub struct EngineInbox {
    tx: mpsc::UnboundedSender<EngineMessage>,
    rx: mpsc::UnboundedReceiver<EngineMessage>,
}

/// Cloneable handle for talking to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl EngineHandle {
    fn send(&self, request: Request) -> Result<()> {
        self.tx
            .send(EngineMessage::Request(request))
            .map_err(|_| Error::ChannelClosed)
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Sink that feeds adapter events into this engine
    pub fn adapter_sink(&self) -> Arc<dyn AdapterEventSink> {
        Arc::new(InboxSink {
            tx: self.tx.clone(),
        })
    }

    pub fn runtime_ready(&self) -> Result<()> {
        self.send(Request::RuntimeReady)
    }

    pub async fn add_entry(&self, entry: MediaEntry) -> Result<EntryId> {
        self.ask(|reply| Request::AddEntry { entry, reply }).await
    }

    pub async fn remove_entry(&self, id: EntryId) -> Result<()> {
        self.ask(|reply| Request::RemoveEntry { id, reply }).await?
    }

    pub async fn edit_entry(&self, id: EntryId, field: EntryField, value: &str) -> Result<()> {
        let value = value.to_string();
        self.ask(|reply| Request::EditEntry {
            id,
            field,
            value,
            reply,
        })
        .await?
    }

    pub async fn toggle_schedule(&self) -> Result<bool> {
        self.ask(|reply| Request::ToggleSchedule { reply }).await
    }

    pub fn set_schedule_enabled(&self, enabled: bool) -> Result<()> {
        self.send(Request::SetScheduleEnabled { enabled })
    }

    pub async fn edit_schedule_window(
        &self,
        id: usize,
        field: WindowField,
        value: &str,
    ) -> Result<()> {
        let value = value.to_string();
        self.ask(|reply| Request::EditScheduleWindow {
            id,
            field,
            value,
            reply,
        })
        .await?
    }

    pub fn start(&self) -> Result<()> {
        self.send(Request::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Request::Stop)
    }

    pub async fn snapshot(&self) -> Result<SequencerSnapshot> {
        self.ask(|reply| Request::Snapshot { reply }).await
    }

    /// Stop playback, cancel timers and end the engine task
    pub async fn shutdown(&self) -> Result<()> {
        self.ask(|reply| Request::Shutdown { reply }).await
    }
}

struct InboxSink {
    tx: mpsc::UnboundedSender<EngineMessage>,
}

impl AdapterEventSink for InboxSink {
    fn deliver(&self, event: AdapterEvent) {
        if self.tx.send(EngineMessage::Adapter(event)).is_err() {
            debug!("Engine gone, dropping adapter event");
        }
    }
}

/// The engine task
pub struct PlaybackEngine {
    sequencer: Sequencer,
    tx: mpsc::UnboundedSender<EngineMessage>,
    rx: mpsc::UnboundedReceiver<EngineMessage>,
    events: EventBus,
    sleeps: HashMap<TimerId, AbortHandle>,
}

impl PlaybackEngine {
    pub fn new(sequencer: Sequencer, inbox: EngineInbox, events: EventBus) -> Self {
        Self {
            sequencer,
            tx: inbox.tx,
            rx: inbox.rx,
            events,
            sleeps: HashMap::new(),
        }
    }

    /// Process messages until shutdown
    pub async fn run(mut self) {
        info!("Playback engine running");
        // Effects queued before the loop (construction-time status)
        self.apply_effects();

        while let Some(message) = self.rx.recv().await {
            match message {
                EngineMessage::Request(Request::Shutdown { reply }) => {
                    self.sequencer.stop();
                    self.apply_effects();
                    self.abort_sleeps();
                    let _ = reply.send(());
                    break;
                }
                EngineMessage::Request(request) => self.handle_request(request),
                EngineMessage::Adapter(event) => self.sequencer.handle_adapter_event(event),
                EngineMessage::TimerFired(id) => {
                    self.sleeps.remove(&id);
                    self.sequencer.fire_timer(id);
                }
            }
            self.apply_effects();
        }

        info!("Playback engine stopped");
    }

    fn handle_request(&mut self, request: Request) {
        let seq = &mut self.sequencer;
        match request {
            Request::RuntimeReady => seq.runtime_ready(),
            Request::AddEntry { entry, reply } => {
                let _ = reply.send(seq.add_entry(entry));
            }
            Request::RemoveEntry { id, reply } => {
                let _ = reply.send(seq.remove_entry(id));
            }
            Request::EditEntry {
                id,
                field,
                value,
                reply,
            } => {
                let _ = reply.send(seq.edit_entry(id, field, &value));
            }
            Request::ToggleSchedule { reply } => {
                let _ = reply.send(seq.toggle_schedule());
            }
            Request::SetScheduleEnabled { enabled } => seq.set_schedule_enabled(enabled),
            Request::EditScheduleWindow {
                id,
                field,
                value,
                reply,
            } => {
                let _ = reply.send(seq.edit_schedule_window(id, field, &value));
            }
            Request::Start => seq.start(),
            Request::Stop => seq.stop(),
            Request::Snapshot { reply } => {
                let _ = reply.send(seq.snapshot());
            }
            Request::Shutdown { .. } => {}
        }
    }

    fn apply_effects(&mut self) {
        for effect in self.sequencer.take_effects() {
            match effect {
                Effect::ArmTimer { id, delay } => self.spawn_sleep(id, delay),
                Effect::CancelTimer(id) => {
                    if let Some(task) = self.sleeps.remove(&id) {
                        task.abort();
                    }
                }
                Effect::Publish(event) => self.events.emit_lossy(event),
            }
        }
    }

    fn spawn_sleep(&mut self, id: TimerId, delay: Duration) {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(EngineMessage::TimerFired(id));
        });
        self.sleeps.insert(id, task.abort_handle());
    }

    fn abort_sleeps(&mut self) {
        for (_, task) in self.sleeps.drain() {
            task.abort();
        }
    }
}
