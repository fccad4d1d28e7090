//! Harness-facing handle to a running bridge.
//!
//! The harness never touches the socket: every interaction goes through
//! this handle, which is backed by the two command queues, the shared
//! device state, and the session phase tracker. Handles are cheap to clone
//! and remain valid across device reconnects; queue *contents* are
//! session-scoped and cleared when a new connection is accepted.
//!
//! # Example
//!
//! ```no_run
//! use brickbridge_network::{BridgeConfig, BridgeServer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = BridgeServer::bind(BridgeConfig::default()).await?;
//! let handle = server.handle();
//! tokio::spawn(server.run());
//!
//! // ... launch the device process, wait for readiness ...
//! while !handle.is_ready() {
//!     tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//! }
//!
//! handle.set_sensor(2, 170);
//! for line in handle.drain_inbound() {
//!     println!("device: {line}");
//! }
//! handle.stop();
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::trace;

use brickbridge_core::{MotorId, SensorChannel};
use brickbridge_emulator::{
    DisplayPanel, MotorBank, MotorStatus, PhaseTracker, SessionPhase, SharedDeviceState,
};
use brickbridge_protocol::{Command, SensorCommand};

use crate::queue::CommandQueue;

/// Metadata for the most recently accepted device connection.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Remote address of the device process.
    pub peer: SocketAddr,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
}

/// Cloneable harness handle to the bridge.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    pub(crate) outbound: Arc<CommandQueue<Command>>,
    pub(crate) inbound: Arc<CommandQueue<String>>,
    pub(crate) state: SharedDeviceState,
    pub(crate) phase: Arc<Mutex<PhaseTracker>>,
    pub(crate) session_info: Arc<Mutex<Option<SessionInfo>>>,
    pub(crate) shutdown: Arc<watch::Sender<bool>>,
}

impl BridgeHandle {
    pub(crate) fn new(shutdown: watch::Sender<bool>) -> Self {
        Self {
            outbound: Arc::new(CommandQueue::new()),
            inbound: Arc::new(CommandQueue::new()),
            state: SharedDeviceState::new(),
            phase: Arc::new(Mutex::new(PhaseTracker::new())),
            session_info: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(shutdown),
        }
    }

    fn phase_tracker(&self) -> MutexGuard<'_, PhaseTracker> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a typed command for delivery to the device.
    ///
    /// Delivery is fire-and-forget: the command is written by the session
    /// pump in FIFO order and no delivery error is ever surfaced here.
    pub fn send(&self, command: Command) {
        self.outbound.push(command);
    }

    /// Queue a verbatim line for delivery with the standard terminator.
    pub fn send_line(&self, line: impl Into<String>) {
        self.send(Command::Raw(line.into()));
    }

    /// Queue a sensor value command.
    ///
    /// Values outside the device's accepted range are silently dropped,
    /// matching the rig's clamp-or-ignore policy; callers must not assume
    /// delivery.
    pub fn set_sensor(&self, sensor_id: u8, value: u16) {
        match SensorCommand::new(sensor_id, value) {
            Some(cmd) => self.send(Command::SetSensor(cmd)),
            None => trace!(sensor_id, value, "sensor value out of range, dropped"),
        }
    }

    /// Queue a sensor value command addressed by logical channel.
    pub fn set_channel(&self, channel: SensorChannel, value: u16) {
        self.set_sensor(channel.wire_id(), value);
    }

    /// Remove and return every inbound line currently queued, oldest first.
    pub fn drain_inbound(&self) -> Vec<String> {
        self.inbound.drain()
    }

    /// Discard all queued inbound lines.
    ///
    /// This is the sole harness-side reset primitive; device state
    /// snapshots are unaffected (state is updated at decode time,
    /// independent of queue consumption).
    pub fn clear_inbound(&self) {
        self.inbound.clear();
    }

    /// Number of inbound lines waiting to be drained.
    #[must_use]
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Whether the active session has completed initialization and entered
    /// the pump loop. Reverts to `false` once the session closes.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase_tracker().current().is_ready()
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase_tracker().current()
    }

    /// Metadata for the most recently accepted connection, if any.
    #[must_use]
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session_info
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Snapshot copy of the display cell map.
    #[must_use]
    pub fn display_snapshot(&self) -> DisplayPanel {
        self.state.display_snapshot()
    }

    /// Snapshot copy of the motor bank.
    #[must_use]
    pub fn motor_snapshot(&self) -> MotorBank {
        self.state.motor_snapshot()
    }

    /// Current status of one motor.
    #[must_use]
    pub fn motor_status(&self, motor: MotorId) -> MotorStatus {
        self.state.motor_status(motor)
    }

    /// Whether a display cell is currently lit.
    #[must_use]
    pub fn cell_lit(&self, cell: usize) -> bool {
        self.state.cell_lit(cell)
    }

    /// Request a cooperative shutdown of the server and any active session.
    ///
    /// The signal is observed at every suspension point (accept, handshake
    /// reads, the pump select), so stopping does not depend on the peer
    /// sending data or closing its socket.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Called by the server when a new connection is accepted: stale device
    /// state and queue contents from the previous session are discarded.
    pub(crate) fn begin_session(&self, peer: SocketAddr) {
        self.state.clear();
        self.outbound.clear();
        self.inbound.clear();
        *self
            .session_info
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(SessionInfo {
            peer,
            connected_at: Utc::now(),
        });
    }
}
