//! Motor state for the emulated rig's three output ports.

use serde::{Deserialize, Serialize};

use brickbridge_core::{MotorDirection, MotorId, constants::MOTOR_COUNT};
use brickbridge_protocol::MotorUpdate;

/// Direction and speed of one motor port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorStatus {
    /// Current drive direction.
    pub direction: MotorDirection,
    /// Current speed as reported by the device.
    pub speed: u16,
}

/// State of all three motor ports, created with every motor off at speed 0.
///
/// Cloning yields an independent snapshot for harness reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorBank {
    motors: [MotorStatus; MOTOR_COUNT],
}

impl MotorBank {
    /// Create a bank with all motors off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a decoded motor update; the stored state becomes exactly the
    /// reported direction and speed.
    pub fn apply(&mut self, update: &MotorUpdate) {
        self.motors[update.motor.index()] = MotorStatus {
            direction: update.direction,
            speed: update.speed,
        };
    }

    /// Current status of one motor.
    #[must_use]
    pub fn status(&self, motor: MotorId) -> MotorStatus {
        self.motors[motor.index()]
    }

    /// Reset every motor to off at speed 0.
    pub fn clear(&mut self) {
        self.motors = [MotorStatus::default(); MOTOR_COUNT];
    }
}
