//! vloop-seq configuration
//!
//! Read once at startup from an optional TOML file; every section and field
//! has a default, so an empty or missing file yields a working setup.
//!
//! ```toml
//! [timing]
//! schedule_recheck_secs = 60
//! skip_backoff_ms = 2000
//!
//! [schedule]
//! enabled = true
//! windows = [{ start = "08:00", stop = "18:00" }]
//!
//! [[entries]]
//! url = "https://www.youtube.com/watch?v=abc123"
//! loop_count = 3
//! delay_seconds = 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use vloop_common::config::{load_toml_or_default, resolve_config_path, CONFIG_ENV_VAR};
use vloop_common::time::millis_to_duration;

use crate::error::{Error, Result};
use crate::playback::entries::{EntryList, MediaEntry};
use crate::playback::sequencer::{SequencerSettings, Timing};
use crate::player::PlayerConfig;
use crate::schedule::{Schedule, WindowField, SCHEDULE_SLOTS};

/// `[timing]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub schedule_recheck_secs: u64,
    pub schedule_exit_poll_secs: u64,
    pub skip_backoff_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            schedule_recheck_secs: 60,
            schedule_exit_poll_secs: 30,
            skip_backoff_ms: 2000,
            error_backoff_ms: 3000,
        }
    }
}

impl TimingConfig {
    /// Convert to sequencer timing; every interval must be non-zero
    pub fn to_timing(&self) -> Result<Timing> {
        let fields = [
            ("schedule_recheck_secs", self.schedule_recheck_secs),
            ("schedule_exit_poll_secs", self.schedule_exit_poll_secs),
            ("skip_backoff_ms", self.skip_backoff_ms),
            ("error_backoff_ms", self.error_backoff_ms),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("[timing] {} must be greater than 0", name)));
        }

        Ok(Timing {
            schedule_recheck: Duration::from_secs(self.schedule_recheck_secs),
            schedule_exit_poll: Duration::from_secs(self.schedule_exit_poll_secs),
            skip_backoff: millis_to_duration(self.skip_backoff_ms),
            error_backoff: millis_to_duration(self.error_backoff_ms),
        })
    }
}

/// One `[schedule].windows` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start: String,
    pub stop: String,
}

/// `[schedule]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub windows: Vec<WindowConfig>,
}

impl ScheduleConfig {
    /// Build the schedule, filling slots in order
    pub fn to_schedule(&self) -> Result<Schedule> {
        if self.windows.len() > SCHEDULE_SLOTS {
            return Err(Error::Config(format!(
                "at most {} schedule windows are supported, got {}",
                SCHEDULE_SLOTS,
                self.windows.len()
            )));
        }

        let mut schedule = Schedule::new();
        schedule.set_enabled(self.enabled);
        for (slot, window) in self.windows.iter().enumerate() {
            schedule
                .edit_window(slot, WindowField::Start, &window.start)
                .and_then(|_| schedule.edit_window(slot, WindowField::Stop, &window.stop))
                .map_err(|e| Error::Config(format!("schedule window {}: {}", slot + 1, e)))?;
        }
        Ok(schedule)
    }
}

/// One `[[entries]]` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub url: String,
    pub loop_count: u32,
    pub delay_seconds: u32,
}

/// The config file as written on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub timing: TimingConfig,
    pub player: PlayerConfig,
    pub schedule: ScheduleConfig,
    pub entries: Vec<EntryConfig>,
}

/// Validated startup configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub entries: EntryList,
    pub schedule: Schedule,
    pub settings: SequencerSettings,
}

impl Config {
    /// Resolve the config path (CLI, then `VLOOP_CONFIG`, then the per-user
    /// file) and load it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let file: FileConfig = load_toml_or_default(path.as_deref())?;
        Self::from_file(file)
    }

    pub fn from_file(file: FileConfig) -> Result<Self> {
        let timing = file.timing.to_timing()?;
        let schedule = file.schedule.to_schedule()?;
        let entries = EntryList::from_entries(
            file.entries
                .iter()
                .map(|e| MediaEntry::new(e.url.trim(), e.loop_count, e.delay_seconds))
                .collect(),
        );
        let gating = match schedule.enabled() {
            true => "enabled",
            false => "disabled",
        };
        info!(
            "Config: {} entries, schedule {} with {} active windows",
            entries.len(),
            gating,
            schedule.active_count()
        );

        Ok(Self {
            entries,
            schedule,
            settings: SequencerSettings {
                timing,
                player: file.player,
            },
        })
    }
}
