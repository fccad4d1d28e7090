//! Protocol-level constants for the rig's ASCII line protocol.
//!
//! The emulated device streams short, heterogeneous status lines and accepts
//! short commands; everything here is derived from the device's wire
//! behavior. Modifying these values breaks compatibility with the
//! device-under-test firmware.
//!
//! # Command vocabulary
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `A`    | sensor value command (`A<id><value:3hex>`) |
//! | `B`    | button command (`B<button><1|0>` press/release) |
//! | `F`    | firmware load (`F<path>`, double line-break terminated) |
//! | `P`    | peripheral command (`PR` = reset) |
//! | `O`    | OS command (`OO` = status check) |
//! | `L`    | display group update (inbound) |
//! | `M`    | motor status update (inbound) |

// ============================================================================
// Line Termination
// ============================================================================

/// Terminator appended to outbound command lines.
pub const OUTBOUND_TERMINATOR: &str = "\r\n";

/// Terminator for firmware-load commands.
///
/// Payload-carrying loads use a double line-break as the end-of-command
/// marker instead of the normal terminator; the device firmware keys on it.
pub const FIRMWARE_TERMINATOR: &str = "\n\n";

/// Delimiter byte for inbound lines. Inbound traffic is `\n`-terminated.
pub const INBOUND_DELIMITER: u8 = b'\n';

// ============================================================================
// Command Forms
// ============================================================================

/// Prefix byte of sensor value commands.
pub const CMD_SENSOR_PREFIX: char = 'A';

/// Peripheral-reset command.
pub const CMD_PERIPHERAL_RESET: &str = "PR";

/// Prefix byte of button commands.
pub const CMD_BUTTON_PREFIX: char = 'B';

/// Prefix byte of firmware-load commands.
pub const CMD_FIRMWARE_PREFIX: char = 'F';

/// OS status-check command.
pub const CMD_OS_CHECK: &str = "OO";

// ============================================================================
// Status Line Forms
// ============================================================================

/// Prefix byte of inbound display group updates (`L<g>,<hex2>`).
pub const STATUS_DISPLAY_PREFIX: u8 = b'L';

/// Prefix byte of inbound motor status updates (`M<m>,<d>,<speed>`).
pub const STATUS_MOTOR_PREFIX: u8 = b'M';

/// Marker line fragment signalling the device OS is up.
///
/// The device answers the startup OS check with a blank-display update.
/// The reference behavior matches this as a *substring* of whatever line
/// arrives, not as an exact message; that is preserved for compatibility
/// even though a longer unrelated line embedding `L0,00` would produce a
/// false-positive readiness signal.
pub const HANDSHAKE_READY_MARKER: &str = "L0,00";

// ============================================================================
// Value Ranges
// ============================================================================

/// Exclusive upper bound for sensor values. Valid range is `0..1024`.
pub const SENSOR_VALUE_LIMIT: u16 = 1024;

/// Number of addressable display cells.
pub const DISPLAY_CELL_COUNT: usize = 100;

/// Number of cells addressed by one display group update.
pub const DISPLAY_GROUP_SIZE: usize = 8;

/// Number of motor ports.
pub const MOTOR_COUNT: usize = 3;

// ============================================================================
// Timing
// ============================================================================

/// Delay between consecutive initialization commands (milliseconds).
///
/// The device has no flow control; initialization trusts protocol timing
/// rather than acknowledgments.
pub const INIT_COMMAND_DELAY_MS: u64 = 200;

/// Delay between the handshake, sensor-init, and firmware phases
/// (milliseconds).
pub const PHASE_SETTLE_DELAY_MS: u64 = 20;

/// Interval between handshake OS-check polls (milliseconds).
pub const HANDSHAKE_POLL_INTERVAL_MS: u64 = 200;

/// Per-attempt read timeout while polling for the readiness marker
/// (milliseconds).
pub const HANDSHAKE_READ_TIMEOUT_MS: u64 = 1000;

/// Default cap on handshake poll attempts before the session fails with a
/// handshake timeout. 150 attempts at the default poll interval gives the
/// device roughly 30 seconds to boot.
pub const HANDSHAKE_ATTEMPT_LIMIT: usize = 150;

// ============================================================================
// Initialization Defaults
// ============================================================================

/// Default raw value driven onto the three input sensors at startup
/// (open-circuit reading).
pub const DEFAULT_SENSOR_VALUE: u16 = 1023;

/// Default raw battery gauge value driven at startup.
pub const DEFAULT_BATTERY_VALUE: u16 = 320;

/// Landmark display cells the device uses for fixed indicators.
///
/// Harnesses assert against these to observe motor arrows and sensor
/// activity markers without decoding the full segment map.
pub mod cells {
    /// Motor A selector segment.
    pub const MOTOR_A_SEL: usize = 58;
    /// Motor A forward arrow.
    pub const MOTOR_A_FWD: usize = 30;
    /// Motor A reverse arrow.
    pub const MOTOR_A_REV: usize = 26;
    /// Motor B selector segment.
    pub const MOTOR_B_SEL: usize = 6;
    /// Motor B forward arrow.
    pub const MOTOR_B_FWD: usize = 10;
    /// Motor B reverse arrow.
    pub const MOTOR_B_REV: usize = 34;
    /// Motor C selector segment.
    pub const MOTOR_C_SEL: usize = 14;
    /// Motor C forward arrow.
    pub const MOTOR_C_FWD: usize = 38;
    /// Motor C reverse arrow.
    pub const MOTOR_C_REV: usize = 22;

    /// Sensor 1 activity marker.
    pub const SENSOR_1_ACTIVE: usize = 49;
    /// Sensor 1 selector segment.
    pub const SENSOR_1_SEL: usize = 48;
    /// Sensor 2 activity marker.
    pub const SENSOR_2_ACTIVE: usize = 40;
    /// Sensor 2 selector segment.
    pub const SENSOR_2_SEL: usize = 44;
    /// Sensor 3 activity marker.
    pub const SENSOR_3_ACTIVE: usize = 20;
    /// Sensor 3 selector segment.
    pub const SENSOR_3_SEL: usize = 36;
}
