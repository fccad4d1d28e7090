//! Connection-session phase machine.
//!
//! Every accepted device connection walks a fixed sequence of phases:
//!
//! - `Listening`: no connection yet; the server is waiting to accept.
//! - `Accepted`: socket accepted, nothing exchanged.
//! - `Handshake`: polling the device with OS checks until it reports ready.
//! - `SensorInit`: driving the four sensor channels to their startup values.
//! - `FirmwareLoad`: pushing a firmware image (only when one is configured).
//! - `Running`: steady-state pump loop; the bridge reports ready.
//! - `Closed`: socket gone; the server may accept a fresh connection.
//!
//! # Valid transitions
//!
//! - Listening → Accepted → Handshake → SensorInit → Running
//! - SensorInit → FirmwareLoad → Running
//! - any phase → Closed, Closed → Accepted (next connection)
//!
//! The tracker validates transitions and keeps a bounded history for
//! debugging session lifecycles.
//!
//! # Examples
//!
//! ```
//! use brickbridge_emulator::{PhaseTracker, SessionPhase};
//!
//! let mut tracker = PhaseTracker::new();
//! assert_eq!(tracker.current(), SessionPhase::Listening);
//!
//! tracker.transition_to(SessionPhase::Accepted).unwrap();
//! assert!(tracker.transition_to(SessionPhase::Running).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use brickbridge_core::{Error, Result};

/// Maximum number of phase transitions kept in history.
///
/// A full session lifecycle is 5-6 transitions, so 64 entries cover roughly
/// ten connect/disconnect cycles, which is plenty for diagnosing a test run.
const MAX_HISTORY_SIZE: usize = 64;

/// Lifecycle phase of a device connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for a device to connect.
    Listening,
    /// Connection accepted, handshake not yet started.
    Accepted,
    /// Polling the device for its readiness marker.
    Handshake,
    /// Driving startup values onto the sensor channels.
    SensorInit,
    /// Loading a configured firmware image.
    FirmwareLoad,
    /// Steady-state pump loop; the bridge is ready for harness traffic.
    Running,
    /// Connection closed.
    Closed,
}

impl SessionPhase {
    /// Check whether a transition to `target` is valid from this phase.
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        if matches!(target, SessionPhase::Closed) {
            // Any live phase can close; closing twice is not a transition.
            return !matches!(self, SessionPhase::Closed);
        }
        matches!(
            (self, target),
            (SessionPhase::Listening, SessionPhase::Accepted)
                | (SessionPhase::Closed, SessionPhase::Accepted)
                | (SessionPhase::Accepted, SessionPhase::Handshake)
                | (SessionPhase::Handshake, SessionPhase::SensorInit)
                | (SessionPhase::SensorInit, SessionPhase::FirmwareLoad | SessionPhase::Running)
                | (SessionPhase::FirmwareLoad, SessionPhase::Running)
        )
    }

    /// Whether the bridge reports ready to the harness in this phase.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionPhase::Running)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Listening => "Listening",
            SessionPhase::Accepted => "Accepted",
            SessionPhase::Handshake => "Handshake",
            SessionPhase::SensorInit => "SensorInit",
            SessionPhase::FirmwareLoad => "FirmwareLoad",
            SessionPhase::Running => "Running",
            SessionPhase::Closed => "Closed",
        };
        write!(f, "{}", s)
    }
}

/// A recorded phase transition.
#[derive(Debug, Clone)]
pub struct PhaseTransition {
    /// Phase transitioned from.
    pub from: SessionPhase,
    /// Phase transitioned to.
    pub to: SessionPhase,
    /// When the transition happened.
    pub timestamp: Instant,
}

impl PhaseTransition {
    fn new(from: SessionPhase, to: SessionPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Elapsed time since this transition.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Validating tracker for the session phase.
#[derive(Debug)]
pub struct PhaseTracker {
    current: SessionPhase,
    entered_at: Instant,
    history: VecDeque<PhaseTransition>,
}

impl PhaseTracker {
    /// Create a tracker in the `Listening` phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: SessionPhase::Listening,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn current(&self) -> SessionPhase {
        self.current
    }

    /// Time spent in the current phase.
    #[must_use]
    pub fn time_in_current_phase(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Recorded transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Transition to a new phase.
    ///
    /// # Errors
    /// Returns `Error::InvalidPhaseTransition` if the transition is not
    /// valid from the current phase.
    pub fn transition_to(&mut self, phase: SessionPhase) -> Result<PhaseTransition> {
        if !self.current.can_transition_to(&phase) {
            return Err(Error::InvalidPhaseTransition {
                from: self.current.to_string(),
                to: phase.to_string(),
            });
        }

        let transition = PhaseTransition::new(self.current, phase);
        self.current = phase;
        self.entered_at = Instant::now();

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(tracker: &mut PhaseTracker, phases: &[SessionPhase]) {
        for phase in phases {
            tracker.transition_to(*phase).unwrap();
        }
    }

    #[test]
    fn test_new_tracker_is_listening() {
        let tracker = PhaseTracker::new();
        assert_eq!(tracker.current(), SessionPhase::Listening);
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn test_full_lifecycle_without_firmware() {
        let mut tracker = PhaseTracker::new();
        advance(
            &mut tracker,
            &[
                SessionPhase::Accepted,
                SessionPhase::Handshake,
                SessionPhase::SensorInit,
                SessionPhase::Running,
                SessionPhase::Closed,
            ],
        );
        assert_eq!(tracker.current(), SessionPhase::Closed);
        assert_eq!(tracker.history().len(), 5);
    }

    #[test]
    fn test_full_lifecycle_with_firmware() {
        let mut tracker = PhaseTracker::new();
        advance(
            &mut tracker,
            &[
                SessionPhase::Accepted,
                SessionPhase::Handshake,
                SessionPhase::SensorInit,
                SessionPhase::FirmwareLoad,
                SessionPhase::Running,
            ],
        );
        assert_eq!(tracker.current(), SessionPhase::Running);
        assert!(tracker.current().is_ready());
    }

    #[test]
    fn test_reconnect_after_close() {
        let mut tracker = PhaseTracker::new();
        advance(
            &mut tracker,
            &[
                SessionPhase::Accepted,
                SessionPhase::Handshake,
                SessionPhase::Closed,
                SessionPhase::Accepted,
            ],
        );
        assert_eq!(tracker.current(), SessionPhase::Accepted);
    }

    #[test]
    fn test_any_live_phase_can_close() {
        for phases in [
            vec![SessionPhase::Accepted],
            vec![SessionPhase::Accepted, SessionPhase::Handshake],
            vec![
                SessionPhase::Accepted,
                SessionPhase::Handshake,
                SessionPhase::SensorInit,
            ],
        ] {
            let mut tracker = PhaseTracker::new();
            advance(&mut tracker, &phases);
            assert!(tracker.transition_to(SessionPhase::Closed).is_ok());
        }
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut tracker = PhaseTracker::new();
        assert!(tracker.transition_to(SessionPhase::Running).is_err());
        assert!(tracker.transition_to(SessionPhase::Handshake).is_err());
        // State unchanged after rejection.
        assert_eq!(tracker.current(), SessionPhase::Listening);
    }

    #[test]
    fn test_skipping_sensor_init_rejected() {
        let mut tracker = PhaseTracker::new();
        advance(&mut tracker, &[SessionPhase::Accepted, SessionPhase::Handshake]);
        assert!(tracker.transition_to(SessionPhase::Running).is_err());
    }

    #[test]
    fn test_double_close_rejected() {
        let mut tracker = PhaseTracker::new();
        advance(&mut tracker, &[SessionPhase::Accepted, SessionPhase::Closed]);
        assert!(tracker.transition_to(SessionPhase::Closed).is_err());
    }

    #[test]
    fn test_only_running_is_ready() {
        for phase in [
            SessionPhase::Listening,
            SessionPhase::Accepted,
            SessionPhase::Handshake,
            SessionPhase::SensorInit,
            SessionPhase::FirmwareLoad,
            SessionPhase::Closed,
        ] {
            assert!(!phase.is_ready());
        }
        assert!(SessionPhase::Running.is_ready());
    }

    #[test]
    fn test_history_records_transitions_in_order() {
        let mut tracker = PhaseTracker::new();
        advance(&mut tracker, &[SessionPhase::Accepted, SessionPhase::Handshake]);

        let history: Vec<_> = tracker.history().iter().collect();
        assert_eq!(history[0].from, SessionPhase::Listening);
        assert_eq!(history[0].to, SessionPhase::Accepted);
        assert_eq!(history[1].from, SessionPhase::Accepted);
        assert_eq!(history[1].to, SessionPhase::Handshake);
    }

    #[test]
    fn test_history_size_limit() {
        let mut tracker = PhaseTracker::new();
        tracker.transition_to(SessionPhase::Accepted).unwrap();
        for _ in 0..100 {
            tracker.transition_to(SessionPhase::Closed).unwrap();
            tracker.transition_to(SessionPhase::Accepted).unwrap();
        }
        assert_eq!(tracker.history().len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_phase_serialization() {
        let phase = SessionPhase::SensorInit;
        let json = serde_json::to_string(&phase).unwrap();
        assert_eq!(json, "\"sensor_init\"");

        let restored: SessionPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, phase);
    }
}
