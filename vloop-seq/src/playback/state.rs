//! Sequencer state machine
//!
//! Holds the current [`PlaybackState`] and rejects transitions that the table
//! below does not list. Re-entering the current state is always allowed and
//! is reported as "no change".

use tracing::debug;

use crate::error::{Error, Result};

pub use vloop_common::events::PlaybackState;

/// Allowed targets from each state (excluding staying put)
pub fn allowed_targets(from: PlaybackState) -> &'static [PlaybackState] {
    use PlaybackState::*;
    match from {
        Idle => &[WaitingForSchedule, Loading, Stopped],
        WaitingForSchedule => &[Loading, Stopped],
        Loading => &[Playing, Paused, Stopped],
        Playing => &[Loading, Paused, Stopped],
        Paused => &[Loading, Playing, Stopped],
        Stopped => &[WaitingForSchedule, Loading],
    }
}

/// Whether `from -> to` is a legal transition
pub fn is_allowed(from: PlaybackState, to: PlaybackState) -> bool {
    from == to || allowed_targets(from).contains(&to)
}

/// Current state plus transition checking
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PlaybackState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
        }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Move to `to`
    ///
    /// Returns the previous state if the state changed, `None` if `to` is the
    /// current state, and an error for an illegal transition.
    pub fn transition(&mut self, to: PlaybackState) -> Result<Option<PlaybackState>> {
        let from = self.state;
        if from == to {
            return Ok(None);
        }
        if !is_allowed(from, to) {
            return Err(Error::InvalidState(format!(
                "illegal transition {} -> {}",
                from, to
            )));
        }
        debug!("State {} -> {}", from, to);
        self.state = to;
        Ok(Some(from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackState::*;

    const ALL: [PlaybackState; 6] = [Idle, WaitingForSchedule, Loading, Playing, Paused, Stopped];

    #[test]
    fn test_every_state_can_stop() {
        for from in ALL {
            assert!(is_allowed(from, Stopped), "{} cannot stop", from);
        }
    }

    #[test]
    fn test_nothing_returns_to_idle() {
        for from in ALL.iter().filter(|s| **s != Idle) {
            assert!(!is_allowed(*from, Idle));
        }
    }

    #[test]
    fn test_cannot_play_without_loading() {
        assert!(!is_allowed(Idle, Playing));
        assert!(!is_allowed(Stopped, Playing));
        assert!(!is_allowed(WaitingForSchedule, Playing));
    }

    #[test]
    fn test_transition_reports_change() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.transition(Loading).unwrap(), Some(Idle));
        assert_eq!(machine.transition(Loading).unwrap(), None);
        assert_eq!(machine.transition(Playing).unwrap(), Some(Loading));
        assert_eq!(machine.state(), Playing);
    }

    #[test]
    fn test_illegal_transition_keeps_state() {
        let mut machine = StateMachine::new();
        assert!(machine.transition(Paused).is_err());
        assert_eq!(machine.state(), Idle);
    }
}
