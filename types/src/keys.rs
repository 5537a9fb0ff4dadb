//! Key and signature byte types.
//!
//! Claimant, coin-owner and signer keys are compressed Ristretto points.
//! Custodian acknowledgements use Ed25519, so they get their own types.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bytes::impl_fixed_bytes;

/// A 32-byte compressed Ristretto public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl_fixed_bytes!(PublicKey, 32);

/// A 32-byte Ristretto secret scalar (canonical little-endian encoding).
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

/// A 64-byte Schnorr signature: compressed nonce point `R` followed by the
/// scalar `s`. Also used for unblinded coin existence proofs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 64]);

impl_fixed_bytes!(Signature, 64);

/// The custodian's Ed25519 acknowledgement verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckKey(pub [u8; 32]);

impl_fixed_bytes!(AckKey, 32);

/// An Ed25519 signature by the custodian acknowledging some content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckSignature(pub [u8; 64]);

impl_fixed_bytes!(AckSignature, 64);

/// A blinded challenge scalar sent to the custodian for blind signing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlindedMessage(pub [u8; 32]);

impl_fixed_bytes!(BlindedMessage, 32);

/// The custodian's blind signature scalar over a [`BlindedMessage`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlindedSignature(pub [u8; 32]);

impl_fixed_bytes!(BlindedSignature, 32);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl AckKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AckSignature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}
