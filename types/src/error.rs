//! Parsing and validation errors for primitive types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("magnitude {0} is out of range")]
    InvalidMagnitude(u8),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
