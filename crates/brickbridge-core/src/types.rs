use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Motor identifier for the three output ports of the emulated rig.
///
/// Wire encoding is a single decimal digit: 0 = A, 1 = B, 2 = C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorId {
    A,
    B,
    C,
}

impl MotorId {
    /// All motors in wire-id order.
    pub const ALL: [MotorId; 3] = [MotorId::A, MotorId::B, MotorId::C];

    /// Create a motor id from its wire digit.
    ///
    /// # Errors
    /// Returns `Error::InvalidMotorId` if the value is not 0, 1, or 2.
    #[inline]
    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MotorId::A),
            1 => Ok(MotorId::B),
            2 => Ok(MotorId::C),
            _ => Err(Error::InvalidMotorId { code: value }),
        }
    }

    /// Wire digit for this motor.
    #[inline]
    #[must_use]
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    /// Zero-based index, usable for array storage.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorId::A => write!(f, "A"),
            MotorId::B => write!(f, "B"),
            MotorId::C => write!(f, "C"),
        }
    }
}

/// Motor drive direction as reported by the device.
///
/// Wire encoding is a single decimal digit in motor-status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MotorDirection {
    #[default]
    Off = 0,
    Reverse = 1,
    Forward = 2,
    Brake = 3,
}

impl MotorDirection {
    /// Create a direction from its wire code.
    ///
    /// # Errors
    /// Returns `Error::InvalidDirection` if the code is not 0-3.
    #[inline]
    pub fn from_code(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MotorDirection::Off),
            1 => Ok(MotorDirection::Reverse),
            2 => Ok(MotorDirection::Forward),
            3 => Ok(MotorDirection::Brake),
            _ => Err(Error::InvalidDirection { code: value }),
        }
    }

    /// Wire code for this direction.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the motor is actively driven (forward or reverse).
    #[inline]
    #[must_use]
    pub fn is_driven(self) -> bool {
        matches!(self, MotorDirection::Forward | MotorDirection::Reverse)
    }
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MotorDirection::Off => "Off",
            MotorDirection::Reverse => "Reverse",
            MotorDirection::Forward => "Forward",
            MotorDirection::Brake => "Brake",
        };
        write!(f, "{}", s)
    }
}

/// Logical sensor channel of the emulated rig.
///
/// The wire ids do NOT follow the logical numbering: the device maps
/// sensor 1 to id 2, sensor 2 to id 1, sensor 3 to id 0, and the battery
/// gauge to id 3. Keeping the mapping here avoids scattering raw ids
/// through calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    Sensor1,
    Sensor2,
    Sensor3,
    Battery,
}

impl SensorChannel {
    /// All channels in the order the initialization sequence addresses them.
    pub const INIT_ORDER: [SensorChannel; 4] = [
        SensorChannel::Sensor1,
        SensorChannel::Sensor2,
        SensorChannel::Sensor3,
        SensorChannel::Battery,
    ];

    /// Wire id used in sensor commands.
    #[inline]
    #[must_use]
    pub fn wire_id(self) -> u8 {
        match self {
            SensorChannel::Sensor1 => 2,
            SensorChannel::Sensor2 => 1,
            SensorChannel::Sensor3 => 0,
            SensorChannel::Battery => 3,
        }
    }

    /// Create a channel from its wire id.
    ///
    /// # Errors
    /// Returns `Error::InvalidSensorChannel` if the id is not 0-3.
    #[inline]
    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            2 => Ok(SensorChannel::Sensor1),
            1 => Ok(SensorChannel::Sensor2),
            0 => Ok(SensorChannel::Sensor3),
            3 => Ok(SensorChannel::Battery),
            _ => Err(Error::InvalidSensorChannel { code: value }),
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorChannel::Sensor1 => "sensor1",
            SensorChannel::Sensor2 => "sensor2",
            SensorChannel::Sensor3 => "sensor3",
            SensorChannel::Battery => "battery",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, MotorId::A)]
    #[case(1, MotorId::B)]
    #[case(2, MotorId::C)]
    fn test_motor_id_wire_roundtrip(#[case] wire: u8, #[case] expected: MotorId) {
        let id = MotorId::from_wire(wire).unwrap();
        assert_eq!(id, expected);
        assert_eq!(id.to_wire(), wire);
        assert_eq!(id.index(), wire as usize);
    }

    #[rstest]
    #[case(3)]
    #[case(9)]
    fn test_motor_id_invalid(#[case] wire: u8) {
        assert!(MotorId::from_wire(wire).is_err());
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(MotorDirection::from_code(0).unwrap(), MotorDirection::Off);
        assert_eq!(
            MotorDirection::from_code(1).unwrap(),
            MotorDirection::Reverse
        );
        assert_eq!(
            MotorDirection::from_code(2).unwrap(),
            MotorDirection::Forward
        );
        assert_eq!(MotorDirection::from_code(3).unwrap(), MotorDirection::Brake);
        assert!(MotorDirection::from_code(4).is_err());

        assert_eq!(MotorDirection::Forward.code(), 2);
        assert_eq!(MotorDirection::default(), MotorDirection::Off);
    }

    #[test]
    fn test_direction_is_driven() {
        assert!(MotorDirection::Forward.is_driven());
        assert!(MotorDirection::Reverse.is_driven());
        assert!(!MotorDirection::Off.is_driven());
        assert!(!MotorDirection::Brake.is_driven());
    }

    #[test]
    fn test_sensor_channel_wire_mapping() {
        assert_eq!(SensorChannel::Sensor1.wire_id(), 2);
        assert_eq!(SensorChannel::Sensor2.wire_id(), 1);
        assert_eq!(SensorChannel::Sensor3.wire_id(), 0);
        assert_eq!(SensorChannel::Battery.wire_id(), 3);

        for channel in SensorChannel::INIT_ORDER {
            assert_eq!(SensorChannel::from_wire(channel.wire_id()).unwrap(), channel);
        }
        assert!(SensorChannel::from_wire(4).is_err());
    }

    #[test]
    fn test_init_order_matches_wire_sequence() {
        let ids: Vec<u8> = SensorChannel::INIT_ORDER
            .iter()
            .map(|c| c.wire_id())
            .collect();
        assert_eq!(ids, vec![2, 1, 0, 3]);
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&MotorId::A).unwrap(), "\"a\"");
        assert_eq!(
            serde_json::to_string(&MotorDirection::Forward).unwrap(),
            "\"forward\""
        );
        assert_eq!(
            serde_json::to_string(&SensorChannel::Battery).unwrap(),
            "\"battery\""
        );
    }
}
