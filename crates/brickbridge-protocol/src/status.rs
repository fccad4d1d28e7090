//! Inbound status-line parsing.
//!
//! The device streams short ASCII status lines. Dispatch is prefix-based
//! rather than a strict grammar: a line that matches none of the known
//! forms, or matches a known prefix with a malformed body, is classified as
//! [`StatusLine::Opaque`]. Opaque lines are still forwarded to the harness
//! but never mutate typed state.
//!
//! # Wire forms
//!
//! - `L<g>,<hex2>` - display group update: the digit at position 1 selects
//!   the cell group, the two hex digits at positions 3-4 are the bitmask.
//! - `M<m>,<d>,<speed>` - motor update: digit 1 is the motor id, digit 3
//!   the direction code, the remaining digits the speed.
//!
//! # Examples
//!
//! ```
//! use brickbridge_protocol::{DisplayUpdate, StatusLine};
//!
//! match StatusLine::parse("L1,02") {
//!     StatusLine::Display(DisplayUpdate { group, mask }) => {
//!         assert_eq!(group, 1);
//!         assert_eq!(mask, 0x02);
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//!
//! assert!(matches!(StatusLine::parse("garbage"), StatusLine::Opaque));
//! ```

use serde::{Deserialize, Serialize};

use brickbridge_core::constants::{STATUS_DISPLAY_PREFIX, STATUS_MOTOR_PREFIX};
use brickbridge_core::{MotorDirection, MotorId};

/// A decoded display group update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUpdate {
    /// Cell group selector; the update addresses cells `8*group..8*group+8`.
    pub group: u8,
    /// Bitmask of lit cells within the group, bit `i` for cell `8*group+i`.
    pub mask: u8,
}

/// A decoded motor status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorUpdate {
    /// Motor the update targets.
    pub motor: MotorId,
    /// Reported drive direction.
    pub direction: MotorDirection,
    /// Reported speed. Accepted as-is from the wire; the device is trusted
    /// and no bounds are imposed beyond what fits the integer.
    pub speed: u16,
}

/// One inbound line, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLine {
    /// A display group update.
    Display(DisplayUpdate),
    /// A motor status update.
    Motor(MotorUpdate),
    /// Any line that is not a well-formed known status form.
    Opaque,
}

impl StatusLine {
    /// Classify a raw inbound line.
    ///
    /// Never fails: unknown or malformed lines come back as
    /// [`StatusLine::Opaque`].
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let bytes = line.as_bytes();
        match bytes.first() {
            Some(&STATUS_DISPLAY_PREFIX) => {
                Self::parse_display(bytes).unwrap_or(StatusLine::Opaque)
            }
            Some(&STATUS_MOTOR_PREFIX) => Self::parse_motor(line).unwrap_or(StatusLine::Opaque),
            _ => StatusLine::Opaque,
        }
    }

    /// Returns `true` when the line carried a typed update.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        !matches!(self, StatusLine::Opaque)
    }

    // Positions are fixed by the wire layout: `L` digit `,` hex hex.
    // Trailing bytes beyond the bitmask are ignored, matching the device's
    // own tolerance for padded lines.
    fn parse_display(bytes: &[u8]) -> Option<StatusLine> {
        if bytes.len() < 5 || bytes[2] != b',' {
            return None;
        }
        let group = (bytes[1] as char).to_digit(10)? as u8;
        let hex = std::str::from_utf8(&bytes[3..5]).ok()?;
        let mask = u8::from_str_radix(hex, 16).ok()?;
        Some(StatusLine::Display(DisplayUpdate { group, mask }))
    }

    // `M` digit `,` digit `,` digits; everything after the second comma is
    // the speed field.
    fn parse_motor(line: &str) -> Option<StatusLine> {
        let bytes = line.as_bytes();
        if bytes.len() < 6 || bytes[2] != b',' || bytes[4] != b',' {
            return None;
        }
        let motor_digit = (bytes[1] as char).to_digit(10)? as u8;
        let direction_digit = (bytes[3] as char).to_digit(10)? as u8;
        let motor = MotorId::from_wire(motor_digit).ok()?;
        let direction = MotorDirection::from_code(direction_digit).ok()?;
        let speed = line[5..].parse::<u16>().ok()?;
        Some(StatusLine::Motor(MotorUpdate {
            motor,
            direction,
            speed,
        }))
    }
}
