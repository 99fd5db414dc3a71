//! Daily schedule windows
//!
//! A schedule is a fixed set of [`SCHEDULE_SLOTS`] start/stop pairs. A window
//! only counts when both ends are set. A window whose start is later than its
//! stop wraps past midnight.

use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use vloop_common::time::{format_time_of_day, minutes_of_day, parse_time_of_day};

use crate::error::{Error, Result};

/// Number of pre-allocated schedule windows
pub const SCHEDULE_SLOTS: usize = 5;

/// One start/stop pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    /// Slot index, 0-based
    pub id: usize,
    pub start: Option<NaiveTime>,
    pub stop: Option<NaiveTime>,
}

impl ScheduleWindow {
    /// Empty window in slot `id`
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            start: None,
            stop: None,
        }
    }

    /// Both ends set
    pub fn is_active(&self) -> bool {
        self.start.is_some() && self.stop.is_some()
    }

    /// Whether `now_minutes` (minutes since midnight) falls inside this window
    ///
    /// Inactive windows never match. The stop minute itself is excluded.
    pub fn contains_minutes(&self, now_minutes: u32) -> bool {
        let (Some(start), Some(stop)) = (self.start, self.stop) else {
            return false;
        };
        let start = minutes_of_day(&start);
        let stop = minutes_of_day(&stop);

        if start <= stop {
            now_minutes >= start && now_minutes < stop
        } else {
            now_minutes >= start || now_minutes < stop
        }
    }
}

impl std::fmt::Display for ScheduleWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |t: &Option<NaiveTime>| {
            t.as_ref()
                .map(format_time_of_day)
                .unwrap_or_else(|| "--:--".to_string())
        };
        write!(f, "#{} {}-{}", self.id, show(&self.start), show(&self.stop))
    }
}

/// Which end of a window an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowField {
    Start,
    Stop,
}

impl FromStr for WindowField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "starttime" | "start_time" => Ok(WindowField::Start),
            "stop" | "stoptime" | "stop_time" => Ok(WindowField::Stop),
            other => Err(Error::InvalidField(other.to_string())),
        }
    }
}

/// Decide whether `now` falls inside any active window.
///
/// Always true when the schedule is disabled. With the schedule enabled and
/// no active window, the answer is false.
pub fn is_within_schedule(windows: &[ScheduleWindow], enabled: bool, now: NaiveTime) -> bool {
    if !enabled {
        return true;
    }

    let now_minutes = minutes_of_day(&now);
    windows
        .iter()
        .filter(|w| w.is_active())
        .any(|w| w.contains_minutes(now_minutes))
}

/// The schedule: an enable flag plus the fixed window slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    enabled: bool,
    windows: [ScheduleWindow; SCHEDULE_SLOTS],
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            enabled: false,
            windows: std::array::from_fn(ScheduleWindow::empty),
        }
    }
}

impl Schedule {
    /// Disabled schedule with all slots empty
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip the enable flag, returning the new value
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn windows(&self) -> &[ScheduleWindow] {
        &self.windows
    }

    /// Active window count
    pub fn active_count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_active()).count()
    }

    /// Set one end of window `id`; `None` clears it
    pub fn set_window_time(
        &mut self,
        id: usize,
        field: WindowField,
        time: Option<NaiveTime>,
    ) -> Result<()> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or(Error::WindowNotFound(id))?;
        match field {
            WindowField::Start => window.start = time,
            WindowField::Stop => window.stop = time,
        }
        Ok(())
    }

    /// Edit one end of window `id` from user text (`HH:MM`, or empty to clear)
    pub fn edit_window(&mut self, id: usize, field: WindowField, value: &str) -> Result<()> {
        let time = parse_time_of_day(value).map_err(|e| Error::InvalidTime(e.to_string()))?;
        self.set_window_time(id, field, time)
    }

    /// Evaluate against `now`
    pub fn is_within(&self, now: NaiveTime) -> bool {
        is_within_schedule(&self.windows, self.enabled, now)
    }
}
