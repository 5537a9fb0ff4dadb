//! Schnorr signatures over Ristretto255.
//!
//! A signature is the compressed nonce point `R` followed by `s = k + c·x`,
//! where `c = H(R, X, m)`. Nonces are derived from the key and message, so
//! signing is deterministic.
//!
//! Signing with the sum of several private keys yields a signature that
//! verifies against the sum of their public keys. Transfers use this to
//! authorize every input with one signature.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use hookpay_types::{PrivateKey, PublicKey, Signature};

use crate::error::CryptoError;
use crate::hash::hash_labeled_wide;
use crate::keys::{point_to_public, to_point, to_scalar};

const CHALLENGE_LABEL: &str = "hookpay/schnorr";
const NONCE_LABEL: &str = "hookpay/nonce";

/// Sign a message with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    sign_with_scalar(message, to_scalar(private_key))
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for malformed points or non-canonical scalars.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(x) = to_point(public_key) else {
        return false;
    };
    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&signature.0[..32]);
    let Some(r) = CompressedRistretto(r_bytes).decompress() else {
        return false;
    };
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature.0[32..]);
    let Some(s) = Option::<Scalar>::from(Scalar::from_canonical_bytes(s_bytes)) else {
        return false;
    };
    let c = challenge(&r_bytes, &public_key.0, message);
    RISTRETTO_BASEPOINT_POINT * s == r + x * c
}

/// Sign with the sum of `keys`. Verifies under [`aggregate_public_keys`] of
/// the matching public keys.
pub fn aggregate_sign(message: &[u8], keys: &[&PrivateKey]) -> Result<Signature, CryptoError> {
    if keys.is_empty() {
        return Err(CryptoError::EmptyKeySet);
    }
    let sum: Scalar = keys.iter().map(|k| to_scalar(k)).sum();
    Ok(sign_with_scalar(message, sum))
}

/// Sum of public keys.
pub fn aggregate_public_keys(keys: &[PublicKey]) -> Result<PublicKey, CryptoError> {
    if keys.is_empty() {
        return Err(CryptoError::EmptyKeySet);
    }
    let points = keys.iter().map(to_point).collect::<Result<Vec<_>, _>>()?;
    let sum: RistrettoPoint = points.iter().sum();
    Ok(point_to_public(&sum))
}

fn sign_with_scalar(message: &[u8], x: Scalar) -> Signature {
    let public = point_to_public(&(RISTRETTO_BASEPOINT_POINT * x));
    let k = Scalar::from_bytes_mod_order_wide(&hash_labeled_wide(
        NONCE_LABEL,
        &[&x.as_bytes()[..], message],
    ));
    let r = (RISTRETTO_BASEPOINT_POINT * k).compress().to_bytes();
    let c = challenge(&r, &public.0, message);
    let s = k + c * x;

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&r);
    sig[32..].copy_from_slice(s.as_bytes());
    Signature(sig)
}

pub(crate) fn challenge(nonce: &[u8; 32], public: &[u8; 32], message: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(&hash_labeled_wide(
        CHALLENGE_LABEL,
        &[&nonce[..], &public[..], message],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{public_from_private, random_private_key};

    #[test]
    fn sign_and_verify() {
        let sk = random_private_key();
        let pk = public_from_private(&sk);
        let msg = b"test message for hookpay";
        let sig = sign_message(msg, &sk);
        assert!(verify_signature(msg, &sig, &pk));
    }

    #[test]
    fn wrong_message_fails() {
        let sk = random_private_key();
        let sig = sign_message(b"correct message", &sk);
        assert!(!verify_signature(
            b"wrong message",
            &sig,
            &public_from_private(&sk)
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let sk1 = random_private_key();
        let sk2 = random_private_key();
        let sig = sign_message(b"test", &sk1);
        assert!(!verify_signature(b"test", &sig, &public_from_private(&sk2)));
    }

    #[test]
    fn signature_deterministic() {
        let sk = PrivateKey([9u8; 32]);
        let sig1 = sign_message(b"deterministic", &sk);
        let sig2 = sign_message(b"deterministic", &sk);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn tampered_scalar_fails() {
        let sk = random_private_key();
        let mut sig = sign_message(b"m", &sk);
        sig.0[40] ^= 1;
        assert!(!verify_signature(b"m", &sig, &public_from_private(&sk)));
    }

    #[test]
    fn aggregate_signature_verifies_against_key_sum() {
        let keys: Vec<PrivateKey> = (0..3).map(|_| random_private_key()).collect();
        let publics: Vec<PublicKey> = keys.iter().map(public_from_private).collect();
        let refs: Vec<&PrivateKey> = keys.iter().collect();

        let sig = aggregate_sign(b"transfer", &refs).unwrap();
        let agg = aggregate_public_keys(&publics).unwrap();
        assert!(verify_signature(b"transfer", &sig, &agg));
        assert!(!verify_signature(b"transfer", &sig, &publics[0]));
    }

    #[test]
    fn single_key_aggregate_matches_plain_signature() {
        let sk = random_private_key();
        let agg = aggregate_sign(b"m", &[&sk]).unwrap();
        assert_eq!(agg, sign_message(b"m", &sk));
    }

    #[test]
    fn empty_aggregate_rejected() {
        assert!(aggregate_sign(b"m", &[]).is_err());
        assert!(aggregate_public_keys(&[]).is_err());
    }
}
