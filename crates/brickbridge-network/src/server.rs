//! Bridge server: accepts one device connection at a time and runs it
//! through a [`ConnectionSession`].
//!
//! # Architecture
//!
//! ```text
//! Harness ──> BridgeHandle ──┬─ outbound queue ─┐
//!                            ├─ inbound queue  ─┤
//!                            └─ state snapshots ┤
//!                                               │
//!             BridgeServer ── ConnectionSession ┴──(TCP)── device-under-test
//! ```
//!
//! The server is single-connection and sequential: a new accept is only
//! issued after the previous session's loop has exited. When a session
//! terminates (error or device disconnect) the server simply accepts the
//! next connection and starts a fresh session at `Accepted`; nothing
//! persists across connections.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use brickbridge_core::SensorChannel;
use brickbridge_core::constants::{
    DEFAULT_BATTERY_VALUE, DEFAULT_SENSOR_VALUE, HANDSHAKE_ATTEMPT_LIMIT,
    HANDSHAKE_POLL_INTERVAL_MS, HANDSHAKE_READ_TIMEOUT_MS, INIT_COMMAND_DELAY_MS,
    PHASE_SETTLE_DELAY_MS,
};

use crate::handle::BridgeHandle;
use crate::session::ConnectionSession;

/// Startup values driven onto the sensor channels during initialization.
#[derive(Debug, Clone, Copy)]
pub struct SensorInitValues {
    /// Raw value for sensor 1.
    pub sensor_1: u16,
    /// Raw value for sensor 2.
    pub sensor_2: u16,
    /// Raw value for sensor 3.
    pub sensor_3: u16,
    /// Raw battery gauge value.
    pub battery: u16,
}

impl SensorInitValues {
    /// Value for a given logical channel.
    #[must_use]
    pub fn value_for(&self, channel: SensorChannel) -> u16 {
        match channel {
            SensorChannel::Sensor1 => self.sensor_1,
            SensorChannel::Sensor2 => self.sensor_2,
            SensorChannel::Sensor3 => self.sensor_3,
            SensorChannel::Battery => self.battery,
        }
    }
}

impl Default for SensorInitValues {
    fn default() -> Self {
        Self {
            sensor_1: DEFAULT_SENSOR_VALUE,
            sensor_2: DEFAULT_SENSOR_VALUE,
            sensor_3: DEFAULT_SENSOR_VALUE,
            battery: DEFAULT_BATTERY_VALUE,
        }
    }
}

/// Bounded-retry parameters for the startup handshake.
///
/// The reference behavior polls forever; bounding the retry turns an
/// unresponsive device into a distinct `HandshakeTimeout` session error
/// instead of a hang.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    /// Pause between sending an OS check and reading the reply.
    pub poll_interval: Duration,
    /// Per-attempt read timeout while waiting for the readiness marker.
    pub read_timeout: Duration,
    /// Maximum poll attempts before the session fails.
    pub attempt_limit: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(HANDSHAKE_POLL_INTERVAL_MS),
            read_timeout: Duration::from_millis(HANDSHAKE_READ_TIMEOUT_MS),
            attempt_limit: HANDSHAKE_ATTEMPT_LIMIT,
        }
    }
}

/// Configuration for a bridge server.
///
/// # Example
///
/// ```
/// use brickbridge_network::BridgeConfig;
///
/// let config = BridgeConfig {
///     bind_addr: "127.0.0.1:50637".parse().unwrap(),
///     firmware_path: Some("/rig/firmware.lx".to_string()),
///     ..BridgeConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address to listen on for the device-under-test.
    pub bind_addr: SocketAddr,

    /// Firmware image path to push after sensor init; `None` skips the
    /// firmware-load phase. The path is interpreted by the device process.
    pub firmware_path: Option<String>,

    /// Startup sensor values.
    pub sensor_init: SensorInitValues,

    /// Handshake retry parameters.
    pub handshake: HandshakeConfig,

    /// Delay between consecutive initialization commands.
    pub command_delay: Duration,

    /// Delay between the handshake, sensor-init, and firmware phases.
    pub settle_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:50637".parse().expect("static address"),
            firmware_path: None,
            sensor_init: SensorInitValues::default(),
            handshake: HandshakeConfig::default(),
            command_delay: Duration::from_millis(INIT_COMMAND_DELAY_MS),
            settle_delay: Duration::from_millis(PHASE_SETTLE_DELAY_MS),
        }
    }
}

/// Errors from bridge server lifecycle operations.
#[derive(Debug, Error)]
pub enum BridgeServerError {
    /// Failed to bind the listener.
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Low-level I/O error on the listener.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// TCP server exposing the rig's line protocol to one device at a time.
///
/// # Example
///
/// ```no_run
/// use brickbridge_network::{BridgeConfig, BridgeServer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = BridgeServer::bind(BridgeConfig::default()).await?;
/// let handle = server.handle();
///
/// let server_task = tokio::spawn(server.run());
///
/// // ... drive the bridge through `handle` ...
///
/// handle.stop();
/// server_task.await??;
/// # Ok(())
/// # }
/// ```
pub struct BridgeServer {
    listener: TcpListener,
    config: BridgeConfig,
    handle: BridgeHandle,
    shutdown: watch::Receiver<bool>,
}

impl BridgeServer {
    /// Bind the listener and prepare the harness handle.
    ///
    /// # Errors
    ///
    /// Returns `BridgeServerError::BindFailed` if the address is in use or
    /// not bindable.
    pub async fn bind(config: BridgeConfig) -> Result<Self, BridgeServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| BridgeServerError::BindFailed(config.bind_addr))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = BridgeHandle::new(shutdown_tx);

        info!(
            addr = %listener.local_addr().unwrap_or(config.bind_addr),
            "bridge server listening"
        );

        Ok(Self {
            listener,
            config,
            handle,
            shutdown: shutdown_rx,
        })
    }

    /// Cloneable harness handle for this server.
    #[must_use]
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Actual bound address; useful with a port-0 bind in tests.
    pub fn local_addr(&self) -> Result<SocketAddr, BridgeServerError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Accept-and-serve loop.
    ///
    /// Runs until [`BridgeHandle::stop`] is called. Session failures
    /// (handshake timeout, device disconnect, socket error) are logged and
    /// the loop continues with the next accept; only listener-level errors
    /// abort the server.
    pub async fn run(mut self) -> Result<(), BridgeServerError> {
        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = self.shutdown.wait_for(|stop| *stop) => break,
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!(%peer, error = %e, "failed to set TCP_NODELAY");
            }

            info!(%peer, "device connected");
            self.handle.begin_session(peer);

            let session =
                ConnectionSession::new(stream, peer, self.config.clone(), self.handle.clone());
            match session.run().await {
                Ok(()) => info!(%peer, "session ended"),
                Err(e) => warn!(%peer, error = %e, "session terminated"),
            }
        }

        info!("bridge server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.bind_addr.port(), 50637);
        assert!(config.firmware_path.is_none());
        assert_eq!(config.command_delay, Duration::from_millis(200));
        assert_eq!(config.settle_delay, Duration::from_millis(20));
    }

    #[test]
    fn test_sensor_init_defaults() {
        let values = SensorInitValues::default();
        assert_eq!(values.sensor_1, 1023);
        assert_eq!(values.sensor_2, 1023);
        assert_eq!(values.sensor_3, 1023);
        assert_eq!(values.battery, 320);

        assert_eq!(values.value_for(SensorChannel::Battery), 320);
        assert_eq!(values.value_for(SensorChannel::Sensor2), 1023);
    }

    #[test]
    fn test_handshake_defaults() {
        let handshake = HandshakeConfig::default();
        assert_eq!(handshake.poll_interval, Duration::from_millis(200));
        assert_eq!(handshake.attempt_limit, 150);
    }

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let config = BridgeConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..BridgeConfig::default()
        };

        let server = BridgeServer::bind(config).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_handle_before_any_connection() {
        let config = BridgeConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..BridgeConfig::default()
        };

        let server = BridgeServer::bind(config).await.unwrap();
        let handle = server.handle();

        assert!(!handle.is_ready());
        assert!(handle.drain_inbound().is_empty());
    }
}
