//! Emulated device state for the bridge.
//!
//! This crate holds the typed state decoded from inbound status lines
//! (display cell map, motor bank) and the phase machine a connection
//! session walks from accept to close.

pub mod display;
pub mod motors;
pub mod phase;
pub mod state;

pub use display::DisplayPanel;
pub use motors::{MotorBank, MotorStatus};
pub use phase::{PhaseTracker, PhaseTransition, SessionPhase};
pub use state::{DeviceState, SharedDeviceState};
