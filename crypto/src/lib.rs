//! Cryptographic primitives for the hookpay wallet engine.
//!
//! - **Blake2b** with domain-separation labels for every content hash
//! - **Ristretto255 Schnorr** for claim authorization and aggregate transfer
//!   authorization
//! - **Blind Schnorr** for coin existence proofs
//! - **Ed25519** for custodian acknowledgements
//! - **BIP39** mnemonics and seeds
//! - P2WSH bitcoin deposit addresses committing to a claimant key

pub mod ack;
pub mod address;
pub mod blind;
pub mod error;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use ack::{ack_key_from_secret, sign_ack, verify_ack};
pub use address::{deposit_address, validate_bitcoin_address};
pub use blind::{blind_message, blind_sign, unblind, UnblindingFactor};
pub use error::CryptoError;
pub use hash::{hash_labeled, hmac_sha512};
pub use keys::{
    private_key_from_wide, public_from_private, random_private_key, tweak_private_key,
    tweak_public_key,
};
pub use mnemonic::{generate_mnemonic, seed_from_mnemonic, validate_mnemonic, MnemonicError};
pub use sign::{aggregate_public_keys, aggregate_sign, sign_message, verify_signature};
