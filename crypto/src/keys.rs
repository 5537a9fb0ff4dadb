//! Ristretto255 key handling.
//!
//! Private keys are scalars, public keys are compressed points `x·G`.
//! Tweaking is additive, so a public key can be tweaked in lockstep with its
//! private key without ever seeing it.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use hookpay_types::{PrivateKey, PublicKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::hash::hash_labeled_wide;

const TWEAK_LABEL: &str = "hookpay/tweak";

/// Generate a uniformly random private key.
pub fn random_private_key() -> PrivateKey {
    PrivateKey(Scalar::random(&mut OsRng).to_bytes())
}

/// Reduce 64 bytes of key material to a private key.
pub fn private_key_from_wide(bytes: &[u8; 64]) -> PrivateKey {
    PrivateKey(Scalar::from_bytes_mod_order_wide(bytes).to_bytes())
}

/// Derive the public key `x·G` for a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    point_to_public(&(RISTRETTO_BASEPOINT_POINT * to_scalar(private)))
}

/// `base + H(tweak)`.
pub fn tweak_private_key(base: &PrivateKey, tweak: &[u8]) -> PrivateKey {
    PrivateKey((to_scalar(base) + tweak_scalar(tweak)).to_bytes())
}

/// `base + H(tweak)·G`, matching [`tweak_private_key`] on the public side.
pub fn tweak_public_key(base: &PublicKey, tweak: &[u8]) -> Result<PublicKey, CryptoError> {
    let point = to_point(base)? + RISTRETTO_BASEPOINT_POINT * tweak_scalar(tweak);
    Ok(point_to_public(&point))
}

fn tweak_scalar(tweak: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(&hash_labeled_wide(TWEAK_LABEL, &[tweak]))
}

pub(crate) fn to_scalar(private: &PrivateKey) -> Scalar {
    Scalar::from_bytes_mod_order(private.0)
}

pub(crate) fn to_point(public: &PublicKey) -> Result<RistrettoPoint, CryptoError> {
    CompressedRistretto(public.0)
        .decompress()
        .ok_or(CryptoError::InvalidPoint)
}

pub(crate) fn point_to_public(point: &RistrettoPoint) -> PublicKey {
    PublicKey(point.compress().to_bytes())
}
