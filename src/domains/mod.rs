pub mod qr;
pub mod tokens;
