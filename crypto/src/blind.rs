//! Blind Schnorr signatures.
//!
//! The custodian commits to a nonce `R = k·G` for each coin request. The
//! wallet blinds with `α, β` derived from its blinding secret:
//!
//! ```text
//! R' = R + α·G + β·X
//! c' = H(R', X, m)
//! c  = c' + β            (sent to the custodian)
//! s  = k + c·x           (returned by the custodian)
//! s' = s + α
//! ```
//!
//! `(R', s')` is an ordinary Schnorr signature on `m` under `X`, and the
//! custodian never learns `m`, `R'` or `s'`.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::scalar::Scalar;
use hookpay_types::{BlindedMessage, BlindedSignature, PrivateKey, PublicKey, Signature};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::hash::hash_labeled_wide;
use crate::keys::{to_point, to_scalar};
use crate::sign::challenge;

const ALPHA_LABEL: &str = "hookpay/blind/alpha";
const BETA_LABEL: &str = "hookpay/blind/beta";

/// Wallet-side state needed to turn a blind signature into a proof.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct UnblindingFactor {
    alpha: [u8; 32],
    nonce: [u8; 32],
}

/// Blind `message` for signing by `signer` using the custodian's committed
/// `signer_nonce`. The same `blinding_secret` always yields the same blinding.
pub fn blind_message(
    message: &[u8],
    signer: &PublicKey,
    signer_nonce: &PublicKey,
    blinding_secret: &[u8],
) -> Result<(BlindedMessage, UnblindingFactor), CryptoError> {
    let x = to_point(signer)?;
    let r = to_point(signer_nonce)?;
    let alpha = Scalar::from_bytes_mod_order_wide(&hash_labeled_wide(
        ALPHA_LABEL,
        &[blinding_secret],
    ));
    let beta =
        Scalar::from_bytes_mod_order_wide(&hash_labeled_wide(BETA_LABEL, &[blinding_secret]));

    let blinded_nonce = (r + RISTRETTO_BASEPOINT_POINT * alpha + x * beta)
        .compress()
        .to_bytes();
    let c = challenge(&blinded_nonce, &signer.0, message) + beta;

    Ok((
        BlindedMessage(c.to_bytes()),
        UnblindingFactor {
            alpha: alpha.to_bytes(),
            nonce: blinded_nonce,
        },
    ))
}

/// Custodian side: `s = k + c·x`.
pub fn blind_sign(
    signer: &PrivateKey,
    nonce_secret: &PrivateKey,
    blinded: &BlindedMessage,
) -> Result<BlindedSignature, CryptoError> {
    let c = Option::<Scalar>::from(Scalar::from_canonical_bytes(blinded.0))
        .ok_or(CryptoError::InvalidScalar)?;
    let s = to_scalar(nonce_secret) + c * to_scalar(signer);
    Ok(BlindedSignature(s.to_bytes()))
}

/// Turn the custodian's blind signature into an existence proof.
///
/// The result still has to be checked with
/// [`verify_signature`](crate::sign::verify_signature); a misbehaving
/// custodian produces a proof that fails verification.
pub fn unblind(
    blinded: &BlindedSignature,
    factor: &UnblindingFactor,
) -> Result<Signature, CryptoError> {
    let s = Option::<Scalar>::from(Scalar::from_canonical_bytes(blinded.0))
        .ok_or(CryptoError::InvalidScalar)?;
    let s = s + Scalar::from_bytes_mod_order(factor.alpha);

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&factor.nonce);
    sig[32..].copy_from_slice(s.as_bytes());
    Ok(Signature(sig))
}
