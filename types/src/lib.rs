//! Fundamental types for the hookpay wallet engine.
//!
//! This crate defines the primitives shared across every other crate in the
//! workspace: content hashes, key and signature byte types, coin magnitudes,
//! timestamps and the bitcoin network selector.

mod bytes;

pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod time;

pub use amount::{decompose, Magnitude, MAX_MONEY};
pub use error::TypesError;
pub use hash::Hash;
pub use keys::{
    AckKey, AckSignature, BlindedMessage, BlindedSignature, PrivateKey, PublicKey, Signature,
};
pub use network::Network;
pub use time::Timestamp;
