//! Outbound command vocabulary.
//!
//! Every command the bridge can send to the device-under-test is modeled
//! here as a typed value. Commands are pure data; wire formatting lives in
//! [`Command::wire`] and the byte-level work in the codec module.
//!
//! # Examples
//!
//! ```
//! use brickbridge_protocol::{Command, SensorCommand};
//!
//! let cmd = Command::SetSensor(SensorCommand::new(5, 1023).unwrap());
//! let (payload, terminator) = cmd.wire();
//! assert_eq!(payload, "A53ff");
//! assert_eq!(terminator, "\r\n");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use brickbridge_core::constants::{
    CMD_BUTTON_PREFIX, CMD_FIRMWARE_PREFIX, CMD_OS_CHECK, CMD_PERIPHERAL_RESET, CMD_SENSOR_PREFIX,
    FIRMWARE_TERMINATOR, OUTBOUND_TERMINATOR, SENSOR_VALUE_LIMIT,
};

/// A validated sensor value command.
///
/// Construction enforces the device's accepted value range: values outside
/// `[0, 1024)` yield `None`, which callers treat as "do not send". This is
/// the clamp-or-ignore policy the device expects; an out-of-range value is
/// never an error surfaced to the caller.
///
/// The sensor id is not validated. The device addresses four channels
/// (ids 0-3) but passes any digit through, and harnesses exploit that for
/// fault-injection tests.
///
/// # Examples
///
/// ```
/// use brickbridge_protocol::SensorCommand;
///
/// assert_eq!(SensorCommand::new(5, 1023).unwrap().encode(), "A53ff");
/// assert!(SensorCommand::new(0, 1024).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCommand {
    sensor_id: u8,
    value: u16,
}

impl SensorCommand {
    /// Create a sensor command, or `None` when the value is out of range.
    #[must_use]
    pub fn new(sensor_id: u8, value: u16) -> Option<Self> {
        if value >= SENSOR_VALUE_LIMIT {
            return None;
        }
        Some(Self { sensor_id, value })
    }

    /// Wire id of the addressed sensor.
    #[must_use]
    pub fn sensor_id(&self) -> u8 {
        self.sensor_id
    }

    /// Raw sensor value.
    #[must_use]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Encode as the wire payload: `A<id><value as 3 lowercase hex digits>`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{}{:03x}", CMD_SENSOR_PREFIX, self.sensor_id, self.value)
    }

    /// Decode a sensor command payload back into `(sensor_id, value)`.
    ///
    /// This is the inverse of [`encode`](Self::encode) and exists for test
    /// harnesses that assert on the bridge's outbound traffic.
    #[must_use]
    pub fn decode(payload: &str) -> Option<(u8, u16)> {
        let rest = payload.strip_prefix(CMD_SENSOR_PREFIX)?;
        if rest.len() != 4 {
            return None;
        }
        let sensor_id = rest[..1].parse::<u8>().ok()?;
        let value = u16::from_str_radix(&rest[1..], 16).ok()?;
        Some((sensor_id, value))
    }
}

/// Front-panel buttons of the emulated rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// The on/off button.
    OnOff,
    /// The program-select button.
    Program,
    /// The run button.
    Run,
    /// The view button.
    View,
}

impl Button {
    /// Wire character identifying the button in `B` commands.
    #[must_use]
    pub fn wire_char(self) -> char {
        match self {
            Button::OnOff => 'O',
            Button::Program => 'P',
            Button::Run => 'R',
            Button::View => 'V',
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Button::OnOff => "on/off",
            Button::Program => "program",
            Button::Run => "run",
            Button::View => "view",
        };
        write!(f, "{}", s)
    }
}

/// An outbound command to the device-under-test.
///
/// `Raw` carries a harness-supplied line verbatim (with the standard
/// terminator) for traffic the typed vocabulary does not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Drive a sensor channel to a value.
    SetSensor(SensorCommand),
    /// Reset the device peripherals.
    ResetPeripherals,
    /// Press a front-panel button.
    ButtonPress(Button),
    /// Release a front-panel button.
    ButtonRelease(Button),
    /// Load a firmware image from a path visible to the device process.
    LoadFirmware(String),
    /// Request an OS status check.
    OsCheck,
    /// A verbatim line supplied by the harness.
    Raw(String),
}

impl Command {
    /// Wire payload and terminator for this command.
    ///
    /// Firmware loads use the double line-break end-of-command marker; all
    /// other commands use the standard terminator.
    #[must_use]
    pub fn wire(&self) -> (String, &'static str) {
        match self {
            Command::SetSensor(cmd) => (cmd.encode(), OUTBOUND_TERMINATOR),
            Command::ResetPeripherals => (CMD_PERIPHERAL_RESET.to_string(), OUTBOUND_TERMINATOR),
            Command::ButtonPress(button) => (
                format!("{}{}1", CMD_BUTTON_PREFIX, button.wire_char()),
                OUTBOUND_TERMINATOR,
            ),
            Command::ButtonRelease(button) => (
                format!("{}{}0", CMD_BUTTON_PREFIX, button.wire_char()),
                OUTBOUND_TERMINATOR,
            ),
            Command::LoadFirmware(path) => {
                (format!("{}{}", CMD_FIRMWARE_PREFIX, path), FIRMWARE_TERMINATOR)
            }
            Command::OsCheck => (CMD_OS_CHECK.to_string(), OUTBOUND_TERMINATOR),
            Command::Raw(line) => (line.clone(), OUTBOUND_TERMINATOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_sensor_command_literal_encoding() {
        let cmd = SensorCommand::new(5, 1023).unwrap();
        assert_eq!(cmd.encode(), "A53ff");
    }

    #[rstest]
    #[case(2, 0, "A2000")]
    #[case(1, 0, "A1000")]
    #[case(0, 0, "A0000")]
    #[case(3, 320, "A3140")]
    fn test_sensor_command_encoding(#[case] id: u8, #[case] value: u16, #[case] expected: &str) {
        let cmd = SensorCommand::new(id, value).unwrap();
        assert_eq!(cmd.encode(), expected);
    }

    #[rstest]
    #[case(1024)]
    #[case(2000)]
    #[case(u16::MAX)]
    fn test_sensor_command_out_of_range(#[case] value: u16) {
        assert!(SensorCommand::new(0, value).is_none());
    }

    #[test]
    fn test_sensor_command_decode_roundtrip() {
        let cmd = SensorCommand::new(2, 0x3ff).unwrap();
        assert_eq!(SensorCommand::decode(&cmd.encode()), Some((2, 0x3ff)));
        assert_eq!(SensorCommand::decode("A3140"), Some((3, 320)));
        assert_eq!(SensorCommand::decode("PR"), None);
        assert_eq!(SensorCommand::decode("A3ff"), None);
    }

    #[test]
    fn test_command_wire_forms() {
        assert_eq!(Command::OsCheck.wire(), ("OO".to_string(), "\r\n"));
        assert_eq!(Command::ResetPeripherals.wire(), ("PR".to_string(), "\r\n"));
        assert_eq!(
            Command::ButtonPress(Button::OnOff).wire(),
            ("BO1".to_string(), "\r\n")
        );
        assert_eq!(
            Command::ButtonRelease(Button::OnOff).wire(),
            ("BO0".to_string(), "\r\n")
        );
    }

    #[test]
    fn test_firmware_load_uses_double_break() {
        let cmd = Command::LoadFirmware("/some/path".to_string());
        assert_eq!(cmd.wire(), ("F/some/path".to_string(), "\n\n"));
    }

    #[test]
    fn test_raw_passthrough() {
        let cmd = Command::Raw("XY42".to_string());
        assert_eq!(cmd.wire(), ("XY42".to_string(), "\r\n"));
    }

    #[test]
    fn test_button_wire_chars() {
        assert_eq!(Button::OnOff.wire_char(), 'O');
        assert_eq!(Button::Program.wire_char(), 'P');
        assert_eq!(Button::Run.wire_char(), 'R');
        assert_eq!(Button::View.wire_char(), 'V');
    }
}
