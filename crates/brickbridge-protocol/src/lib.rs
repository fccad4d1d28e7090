pub mod codec;
pub mod command;
pub mod status;

pub use codec::{LineCodec, encode_line};
pub use command::{Button, Command, SensorCommand};
pub use status::{DisplayUpdate, MotorUpdate, StatusLine};
