//! Entry to player bindings
//!
//! Every listed entry owns exactly one player once the runtime is available.
//! Reconciliation creates players for new entries and destroys players whose
//! entry is gone, so no player outlives its entry.

use std::collections::HashMap;

use tracing::debug;

use super::entries::{EntryId, EntryList};
use crate::player::{container_id, PlayerAdapter, PlayerConfig, PlayerFactory, PlayerHandle};

/// One entry's player plus its readiness flag
pub struct Binding {
    pub handle: PlayerHandle,
    pub adapter: Box<dyn PlayerAdapter>,
    pub ready: bool,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("handle", &self.handle)
            .field("ready", &self.ready)
            .finish()
    }
}

/// What a reconciliation pass changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<EntryId>,
    pub destroyed: Vec<EntryId>,
}

/// All live bindings, keyed by entry
#[derive(Debug, Default)]
pub struct BindingMap {
    bindings: HashMap<EntryId, Binding>,
    next_handle: u64,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the binding set in line with `entries`
    pub fn reconcile(
        &mut self,
        entries: &EntryList,
        factory: &mut dyn PlayerFactory,
        config: &PlayerConfig,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for entry in entries.iter() {
            if self.bindings.contains_key(&entry.id) {
                continue;
            }
            self.next_handle += 1;
            let handle = PlayerHandle(self.next_handle);
            let adapter = factory.create(handle, &container_id(&entry.id), config);
            debug!("Bound {} to entry {}", handle, entry.id);
            self.bindings.insert(
                entry.id,
                Binding {
                    handle,
                    adapter,
                    ready: false,
                },
            );
            report.created.push(entry.id);
        }

        let orphans: Vec<EntryId> = self
            .bindings
            .keys()
            .filter(|id| !entries.contains(**id))
            .copied()
            .collect();
        for id in orphans {
            self.release(id);
            report.destroyed.push(id);
        }

        report
    }

    /// Destroy the player bound to `id`; false if there was none
    pub fn release(&mut self, id: EntryId) -> bool {
        match self.bindings.remove(&id) {
            Some(mut binding) => {
                debug!("Destroying {} for entry {}", binding.handle, id);
                binding.adapter.destroy();
                true
            }
            None => false,
        }
    }

    /// Destroy every player
    pub fn release_all(&mut self) {
        let ids: Vec<EntryId> = self.bindings.keys().copied().collect();
        for id in ids {
            self.release(id);
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Binding> {
        self.bindings.get_mut(&id)
    }

    /// Entry currently bound to `handle`
    pub fn entry_for(&self, handle: PlayerHandle) -> Option<EntryId> {
        self.bindings
            .iter()
            .find(|(_, b)| b.handle == handle)
            .map(|(id, _)| *id)
    }

    /// Mark the player behind `handle` ready, returning its entry
    pub fn mark_ready(&mut self, handle: PlayerHandle) -> Option<EntryId> {
        let (id, binding) = self.bindings.iter_mut().find(|(_, b)| b.handle == handle)?;
        binding.ready = true;
        Some(*id)
    }

    pub fn is_ready(&self, id: EntryId) -> bool {
        self.bindings.get(&id).map(|b| b.ready).unwrap_or(false)
    }

    pub fn handle_for(&self, id: EntryId) -> Option<PlayerHandle> {
        self.bindings.get(&id).map(|b| b.handle)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
