pub mod encoder;

pub use encoder::{QrEncodeError, QrEncoder, QrEncoderConfig, QrImage};
