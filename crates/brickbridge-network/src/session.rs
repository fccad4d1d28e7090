//! One accepted device connection, from handshake to close.
//!
//! A `ConnectionSession` owns the framed socket and walks the phase
//! machine: poll the device with OS checks until it reports ready, drive
//! the sensor startup values, optionally push a firmware image, then enter
//! the steady-state pump loop. Initialization commands are fire-and-forget
//! with fixed delays; the device has no flow control or acknowledgment
//! path, so the sequence trusts protocol timing.
//!
//! The pump loop processes at most one inbound line per iteration and
//! flushes the entire outbound queue before the next read, so outbound
//! commands are delivered in FIFO order relative to each other but are not
//! guaranteed to interleave byte-for-byte with specific inbound lines.
//!
//! Any socket-level error terminates the session; the connection is closed
//! in a guaranteed cleanup step regardless of how the loop exits and the
//! server accepts the next connection from scratch.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use brickbridge_core::constants::HANDSHAKE_READY_MARKER;
use brickbridge_core::{Error, Result, SensorChannel};
use brickbridge_emulator::SessionPhase;
use brickbridge_protocol::{Button, Command, LineCodec, SensorCommand, StatusLine};

use crate::handle::BridgeHandle;
use crate::server::BridgeConfig;

/// What woke the pump loop.
enum PumpEvent {
    /// One inbound line arrived.
    Line(String),
    /// The outbound queue signalled new work.
    Flush,
}

/// A single device connection being driven through its lifecycle.
pub(crate) struct ConnectionSession {
    framed: Framed<TcpStream, LineCodec>,
    peer: SocketAddr,
    config: BridgeConfig,
    handle: BridgeHandle,
}

impl ConnectionSession {
    pub(crate) fn new(
        stream: TcpStream,
        peer: SocketAddr,
        config: BridgeConfig,
        handle: BridgeHandle,
    ) -> Self {
        Self {
            framed: Framed::new(stream, LineCodec::new()),
            peer,
            config,
            handle,
        }
    }

    /// Run the session to completion.
    ///
    /// Returns `Ok(())` on a requested shutdown and the terminating error
    /// otherwise. Either way the phase ends up `Closed` and the socket is
    /// shut down before returning.
    pub(crate) async fn run(mut self) -> Result<()> {
        let mut shutdown = self.handle.shutdown.subscribe();

        let result = tokio::select! {
            res = self.drive() => res,
            _ = shutdown.wait_for(|stop| *stop) => Ok(()),
        };

        self.close().await;
        result
    }

    async fn drive(&mut self) -> Result<()> {
        self.transition(SessionPhase::Accepted)?;

        self.transition(SessionPhase::Handshake)?;
        self.handshake().await?;
        sleep(self.config.settle_delay).await;

        self.transition(SessionPhase::SensorInit)?;
        self.init_sensors().await?;
        sleep(self.config.settle_delay).await;

        if let Some(path) = self.config.firmware_path.clone() {
            self.transition(SessionPhase::FirmwareLoad)?;
            self.load_firmware(path).await?;
            sleep(self.config.settle_delay).await;
        }

        self.transition(SessionPhase::Running)?;
        info!(peer = %self.peer, "session initialized, bridge ready");
        self.pump().await
    }

    /// Poll the device with OS checks until it reports ready.
    ///
    /// The readiness marker is matched as a substring of whatever line
    /// arrives (see [`HANDSHAKE_READY_MARKER`]); lines read here are
    /// discarded, not queued. The retry is bounded: exhausting the attempt
    /// limit fails the session with `Error::HandshakeTimeout` instead of
    /// hanging on an unresponsive device.
    async fn handshake(&mut self) -> Result<()> {
        let handshake = self.config.handshake;

        for attempt in 1..=handshake.attempt_limit {
            self.framed.send(Command::OsCheck).await?;
            sleep(handshake.poll_interval).await;

            match timeout(handshake.read_timeout, self.framed.next()).await {
                Ok(Some(Ok(line))) => {
                    if line.contains(HANDSHAKE_READY_MARKER) {
                        debug!(peer = %self.peer, attempt, "device reported ready");
                        return Ok(());
                    }
                    trace!(peer = %self.peer, %line, "discarding pre-handshake line");
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => return Err(Error::ConnectionClosed),
                Err(_) => {
                    trace!(peer = %self.peer, attempt, "handshake poll unanswered");
                }
            }
        }

        Err(Error::HandshakeTimeout {
            attempts: handshake.attempt_limit,
        })
    }

    /// Drive the startup values onto the four sensor channels, in the fixed
    /// order sensor 1, sensor 2, sensor 3, battery.
    async fn init_sensors(&mut self) -> Result<()> {
        let values = self.config.sensor_init;

        for channel in SensorChannel::INIT_ORDER {
            let value = values.value_for(channel);
            match SensorCommand::new(channel.wire_id(), value) {
                Some(cmd) => {
                    trace!(peer = %self.peer, %channel, value, "sensor init");
                    self.framed.send(Command::SetSensor(cmd)).await?;
                }
                None => {
                    warn!(peer = %self.peer, %channel, value, "init value out of range, skipped");
                }
            }
            sleep(self.config.command_delay).await;
        }
        Ok(())
    }

    /// Push the configured firmware image: peripheral reset, an on-button
    /// press/release, the load command with its double line-break marker,
    /// then an OS check to restart the device.
    async fn load_firmware(&mut self, path: String) -> Result<()> {
        debug!(peer = %self.peer, %path, "loading firmware");

        let sequence = [
            Command::ResetPeripherals,
            Command::ButtonPress(Button::OnOff),
            Command::ButtonRelease(Button::OnOff),
            Command::LoadFirmware(path),
            Command::OsCheck,
        ];

        for command in sequence {
            self.framed.send(command).await?;
            sleep(self.config.command_delay).await;
        }
        Ok(())
    }

    /// Steady-state loop: wait for either one inbound line or an outbound
    /// wakeup, then flush the whole outbound queue.
    ///
    /// The event-driven select replaces the reference implementation's
    /// fixed 1 ms poll quantum; CPU stays bounded and a shutdown request
    /// takes effect at the next wakeup instead of waiting for peer data.
    async fn pump(&mut self) -> Result<()> {
        loop {
            self.flush_outbound().await?;

            let event = tokio::select! {
                maybe_line = self.framed.next() => match maybe_line {
                    Some(Ok(line)) => PumpEvent::Line(line),
                    Some(Err(e)) => return Err(e),
                    None => return Err(Error::ConnectionClosed),
                },
                _ = self.handle.outbound.notified() => PumpEvent::Flush,
            };

            if let PumpEvent::Line(line) = event {
                self.handle_inbound(line);
            }
        }
    }

    /// Classify one inbound line, apply any typed update to the state
    /// store, and forward the raw line to the harness unconditionally.
    fn handle_inbound(&self, line: String) {
        let status = StatusLine::parse(&line);
        if self.handle.state.apply(&status) {
            trace!(peer = %self.peer, %line, "status update applied");
        } else {
            trace!(peer = %self.peer, %line, "opaque line forwarded");
        }
        self.handle.inbound.push(line);
    }

    /// Write every queued outbound command to the socket in FIFO order.
    async fn flush_outbound(&mut self) -> Result<()> {
        for command in self.handle.outbound.drain() {
            trace!(peer = %self.peer, ?command, "writing outbound command");
            self.framed.send(command).await?;
        }
        Ok(())
    }

    fn transition(&self, phase: SessionPhase) -> Result<()> {
        let mut tracker = self.handle.phase.lock().unwrap_or_else(|e| e.into_inner());
        let transition = tracker.transition_to(phase)?;
        debug!(
            peer = %self.peer,
            from = %transition.from,
            to = %transition.to,
            "session phase change"
        );
        Ok(())
    }

    /// Guaranteed cleanup: mark the session closed and shut the socket
    /// down. Errors here are logged and swallowed; the connection is gone
    /// either way.
    async fn close(&mut self) {
        {
            let mut tracker = self.handle.phase.lock().unwrap_or_else(|e| e.into_inner());
            if tracker.current() != SessionPhase::Closed {
                // Infallible: every live phase may close.
                let _ = tracker.transition_to(SessionPhase::Closed);
            }
        }

        if let Err(e) = self.framed.get_mut().shutdown().await {
            debug!(peer = %self.peer, error = %e, "socket shutdown during close");
        }
        info!(peer = %self.peer, "session closed");
    }
}
