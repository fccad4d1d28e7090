//! Combined device state store.
//!
//! `DeviceState` aggregates the display panel and motor bank; it is mutated
//! only by the connection session's inbound-line handler. `SharedDeviceState`
//! is the synchronized wrapper handed to the harness: it exposes *snapshot
//! copies* only, never live references, so harness reads cannot race the
//! session thread.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use brickbridge_core::{MotorId, constants::cells};
use brickbridge_protocol::StatusLine;

use crate::{DisplayPanel, MotorBank, MotorStatus};

/// The typed state decoded from inbound status lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Display cell map.
    pub display: DisplayPanel,
    /// Motor port state.
    pub motors: MotorBank,
}

impl DeviceState {
    /// Create a state store with a dark display and all motors off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            display: DisplayPanel::new(),
            motors: MotorBank::new(),
        }
    }

    /// Apply a classified status line.
    ///
    /// Returns `true` when the line carried a typed update and mutated
    /// state; opaque lines leave the store untouched.
    pub fn apply(&mut self, line: &StatusLine) -> bool {
        match line {
            StatusLine::Display(update) => {
                self.display.apply(update);
                true
            }
            StatusLine::Motor(update) => {
                self.motors.apply(update);
                true
            }
            StatusLine::Opaque => false,
        }
    }

    /// Reset to the freshly-created state.
    pub fn clear(&mut self) {
        self.display.clear();
        self.motors.clear();
    }
}

/// Thread-safe handle to the device state, shared between the session task
/// and the harness.
///
/// The session is the sole writer; harness reads go through snapshot
/// accessors that clone under the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedDeviceState {
    inner: Arc<Mutex<DeviceState>>,
}

impl SharedDeviceState {
    /// Create a fresh shared state store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a panic elsewhere mid-update; the state
    // itself is plain data and still usable.
    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a classified status line. Returns `true` when state changed.
    pub fn apply(&self, line: &StatusLine) -> bool {
        self.lock().apply(line)
    }

    /// Snapshot copy of the display panel.
    #[must_use]
    pub fn display_snapshot(&self) -> DisplayPanel {
        self.lock().display.clone()
    }

    /// Snapshot copy of the motor bank.
    #[must_use]
    pub fn motor_snapshot(&self) -> MotorBank {
        self.lock().motors.clone()
    }

    /// Current status of one motor.
    #[must_use]
    pub fn motor_status(&self, motor: MotorId) -> MotorStatus {
        self.lock().motors.status(motor)
    }

    /// Whether a display cell is currently lit.
    #[must_use]
    pub fn cell_lit(&self, cell: usize) -> bool {
        self.lock().display.is_lit(cell)
    }

    /// Reset display and motors, used when a new session begins.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Convenience views over the landmark indicator cells.
impl SharedDeviceState {
    /// Whether the forward arrow of the given motor is lit.
    #[must_use]
    pub fn motor_forward_arrow(&self, motor: MotorId) -> bool {
        let cell = match motor {
            MotorId::A => cells::MOTOR_A_FWD,
            MotorId::B => cells::MOTOR_B_FWD,
            MotorId::C => cells::MOTOR_C_FWD,
        };
        self.cell_lit(cell)
    }

    /// Whether the reverse arrow of the given motor is lit.
    #[must_use]
    pub fn motor_reverse_arrow(&self, motor: MotorId) -> bool {
        let cell = match motor {
            MotorId::A => cells::MOTOR_A_REV,
            MotorId::B => cells::MOTOR_B_REV,
            MotorId::C => cells::MOTOR_C_REV,
        };
        self.cell_lit(cell)
    }
}
