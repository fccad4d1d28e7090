//! Tokio codec for the rig's line protocol.
//!
//! `LineCodec` integrates the protocol with async TCP via the
//! [`Decoder`]/[`Encoder`] traits so sessions can wrap a socket in a
//! `Framed` stream instead of issuing byte-at-a-time reads:
//!
//! ```text
//! TCP stream -> Decoder -> raw inbound line (String)
//! Command    -> Encoder -> TCP stream (ASCII payload + terminator)
//! ```
//!
//! The decoder deliberately yields *raw lines*, not parsed status values:
//! the session forwards every inbound line to the harness unchanged and
//! only additionally applies the ones that classify as typed updates
//! (see [`StatusLine`](crate::StatusLine)).
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use brickbridge_protocol::{Command, LineCodec};
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> brickbridge_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:50637").await?;
//! let mut framed = Framed::new(stream, LineCodec::new());
//!
//! framed.send(Command::OsCheck).await?;
//! if let Some(Ok(line)) = framed.next().await {
//!     println!("device says: {line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Robustness
//!
//! A buffer that grows past the line-length limit without a delimiter is
//! rejected with [`Error::LineTooLong`] rather than accumulating without
//! bound. Legitimate device lines are under a dozen bytes; the default
//! limit of 1 KB is generous.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::Command;
use brickbridge_core::constants::INBOUND_DELIMITER;
use brickbridge_core::{Error, Result};

/// Default maximum inbound line length in bytes.
const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// ASCII-encode a payload and append a terminator.
///
/// Non-ASCII characters are silently dropped rather than rejected; encoding
/// errors are swallowed, never raised. This mirrors the device's own
/// tolerance: it only ever inspects the ASCII bytes it understands.
///
/// # Examples
///
/// ```
/// use brickbridge_protocol::encode_line;
///
/// assert_eq!(encode_line("OO", "\r\n"), b"OO\r\n");
/// assert_eq!(encode_line("A5\u{00e9}3ff", "\r\n"), b"A53ff\r\n");
/// ```
#[must_use]
pub fn encode_line(payload: &str, terminator: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + terminator.len());
    out.extend(payload.chars().filter(char::is_ascii).map(|c| c as u8));
    out.extend_from_slice(terminator.as_bytes());
    out
}

/// Line-oriented codec for one device connection.
///
/// Decodes `\n`-delimited inbound lines (stripping a trailing `\r`) and
/// encodes [`Command`] values with their wire terminator.
#[derive(Debug)]
pub struct LineCodec {
    /// Maximum accepted inbound line length in bytes.
    max_line_length: usize,
}

impl LineCodec {
    /// Create a codec with the default line-length limit.
    pub fn new() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Create a codec with a custom line-length limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Get the configured line-length limit.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = Error;

    /// Extract one inbound line from the byte stream.
    ///
    /// Returns `Ok(Some(line))` with the delimiter (and any trailing `\r`)
    /// stripped, `Ok(None)` when no complete line is buffered yet, or
    /// [`Error::LineTooLong`] when the buffer outgrows the limit without a
    /// delimiter. Non-UTF-8 bytes are replaced rather than rejected; the
    /// protocol is ASCII and anything else is line noise the harness may
    /// still want to see.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(pos) = src.iter().position(|&b| b == INBOUND_DELIMITER) else {
            if src.len() > self.max_line_length {
                return Err(Error::LineTooLong {
                    length: src.len(),
                    limit: self.max_line_length,
                });
            }
            return Ok(None);
        };

        if pos > self.max_line_length {
            return Err(Error::LineTooLong {
                length: pos,
                limit: self.max_line_length,
            });
        }

        let mut line = src.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

impl Encoder<Command> for LineCodec {
    type Error = Error;

    /// Write a command's wire form to the destination buffer.
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        let (payload, terminator) = item.wire();
        dst.extend_from_slice(&encode_line(&payload, terminator));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Button, SensorCommand};

    #[test]
    fn test_encode_line_appends_terminator() {
        assert_eq!(encode_line("PR", "\r\n"), b"PR\r\n");
        assert_eq!(encode_line("F/some/path", "\n\n"), b"F/some/path\n\n");
    }

    #[test]
    fn test_encode_line_drops_non_ascii() {
        assert_eq!(encode_line("caf\u{00e9}", "\r\n"), b"caf\r\n");
        assert_eq!(encode_line("\u{1f600}", "\r\n"), b"\r\n");
    }

    #[test]
    fn test_decode_single_line() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"L1,02\n"[..]);

        let line = codec.decode(&mut buffer).unwrap();
        assert_eq!(line.as_deref(), Some("L1,02"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_strips_carriage_return() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"M0,2,200\r\n"[..]);

        let line = codec.decode(&mut buffer).unwrap();
        assert_eq!(line.as_deref(), Some("M0,2,200"));
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"L1,0"[..]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        // Bytes stay buffered until the delimiter arrives.
        assert_eq!(&buffer[..], b"L1,0");
    }

    #[test]
    fn test_decode_multiple_lines_in_buffer() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"L1,02\nM0,2,200\n"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap().as_deref(), Some("L1,02"));
        assert_eq!(
            codec.decode(&mut buffer).unwrap().as_deref(),
            Some("M0,2,200")
        );
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_empty_line() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::from(&b"\n"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = LineCodec::with_max_line_length(8);
        let mut buffer = BytesMut::from(&b"0123456789abcdef"[..]);

        let result = codec.decode(&mut buffer);
        assert!(matches!(result, Err(Error::LineTooLong { .. })));
    }

    #[test]
    fn test_encode_sensor_command() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();

        let cmd = Command::SetSensor(SensorCommand::new(5, 1023).unwrap());
        codec.encode(cmd, &mut buffer).unwrap();

        assert_eq!(&buffer[..], b"A53ff\r\n");
    }

    #[test]
    fn test_encode_firmware_terminator() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Command::LoadFirmware("/some/path".to_string()), &mut buffer)
            .unwrap();

        assert_eq!(&buffer[..], b"F/some/path\n\n");
    }

    #[test]
    fn test_encode_init_sequence_bytes() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();

        for cmd in [
            Command::ResetPeripherals,
            Command::ButtonPress(Button::OnOff),
            Command::ButtonRelease(Button::OnOff),
            Command::LoadFirmware("/some/path".to_string()),
            Command::OsCheck,
        ] {
            codec.encode(cmd, &mut buffer).unwrap();
        }

        assert_eq!(&buffer[..], b"PR\r\nBO1\r\nBO0\r\nF/some/path\n\nOO\r\n");
    }

    #[test]
    fn test_roundtrip_through_decoder() {
        let mut codec = LineCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Command::Raw("L1,02".to_string()), &mut buffer)
            .unwrap();

        let line = codec.decode(&mut buffer).unwrap();
        assert_eq!(line.as_deref(), Some("L1,02"));
    }
}
