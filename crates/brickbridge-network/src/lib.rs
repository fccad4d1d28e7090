//! Network layer of the bridge: command queues, the connection session,
//! and the single-connection TCP server with its harness handle.

pub mod handle;
pub mod queue;
pub mod server;

mod session;

pub use handle::{BridgeHandle, SessionInfo};
pub use queue::CommandQueue;
pub use server::{BridgeConfig, BridgeServer, BridgeServerError, HandshakeConfig, SensorInitValues};
