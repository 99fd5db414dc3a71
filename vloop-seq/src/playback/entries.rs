//! Media entry list
//!
//! The list keeps insertion order. Playback order is that order filtered to
//! entries with a non-empty URL (the "valid" entries).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vloop_common::uuid_utils;

use crate::error::{Error, Result};

/// Entry identifier (always a v4 UUID, never nil)
pub type EntryId = Uuid;

/// One configured video or playlist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: EntryId,
    pub url: String,
    /// Times to play before advancing; 0 loops forever
    pub loop_count: u32,
    /// Pause after the last loop before advancing
    pub delay_seconds: u32,
}

impl MediaEntry {
    pub fn new(url: impl Into<String>, loop_count: u32, delay_seconds: u32) -> Self {
        Self {
            id: uuid_utils::generate(),
            url: url.into(),
            loop_count,
            delay_seconds,
        }
    }

    /// Entry with an empty URL, as created by the "add" button
    pub fn blank() -> Self {
        Self::new("", 0, 0)
    }

    /// Has a non-empty URL and therefore takes part in playback
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty()
    }

    /// Upper bound on plays per visit; `None` means unbounded
    pub fn max_loops(&self) -> Option<u32> {
        match self.loop_count {
            0 => None,
            n => Some(n),
        }
    }
}

/// Editable entry fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Url,
    LoopCount,
    DelaySeconds,
}

impl FromStr for EntryField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(EntryField::Url),
            "loop" | "loops" | "loop_count" | "loopcount" => Ok(EntryField::LoopCount),
            "delay" | "delay_seconds" | "delayseconds" => Ok(EntryField::DelaySeconds),
            other => Err(Error::InvalidField(other.to_string())),
        }
    }
}

/// Parse a numeric form value: leading digits, anything unparseable is 0
pub fn parse_count(value: &str) -> u32 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Ordered list of entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryList {
    entries: Vec<MediaEntry>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<MediaEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry, returning its id
    pub fn add(&mut self, entry: MediaEntry) -> EntryId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Remove by id, returning the removed entry
    pub fn remove(&mut self, id: EntryId) -> Option<MediaEntry> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(position))
    }

    pub fn get(&self, id: EntryId) -> Option<&MediaEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Apply a form edit
    ///
    /// Numeric fields accept their leading digits and fall back to 0.
    pub fn edit(&mut self, id: EntryId, field: EntryField, value: &str) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::EntryNotFound(id))?;

        match field {
            EntryField::Url => entry.url = value.to_string(),
            EntryField::LoopCount => entry.loop_count = parse_count(value),
            EntryField::DelaySeconds => entry.delay_seconds = parse_count(value),
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in playback order
    pub fn valid(&self) -> impl Iterator<Item = &MediaEntry> {
        self.entries.iter().filter(|e| e.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    /// Valid entry at `index` modulo the valid count
    pub fn valid_at(&self, index: usize) -> Option<&MediaEntry> {
        let count = self.valid_count();
        if count == 0 {
            return None;
        }
        self.valid().nth(index % count)
    }

    /// Position of `id` among the valid entries
    pub fn valid_position(&self, id: EntryId) -> Option<usize> {
        self.valid().position(|e| e.id == id)
    }

    /// Entry at a 1-based list position (as shown to users)
    pub fn at_position(&self, position: usize) -> Option<&MediaEntry> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn to_vec(&self) -> Vec<MediaEntry> {
        self.entries.clone()
    }
}
