use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Invalid motor id: {code}")]
    InvalidMotorId { code: u8 },

    #[error("Invalid motor direction code: {code}")]
    InvalidDirection { code: u8 },

    #[error("Invalid sensor channel id: {code}")]
    InvalidSensorChannel { code: u8 },

    #[error("Inbound line exceeds {limit} bytes (got {length})")]
    LineTooLong { length: usize, limit: usize },

    // Session errors
    #[error("Handshake timed out after {attempts} attempts")]
    HandshakeTimeout { attempts: usize },

    #[error("Invalid session phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
