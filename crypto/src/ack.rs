//! Custodian acknowledgements (Ed25519 over content hashes).

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use hookpay_types::{AckKey, AckSignature, Hash, PrivateKey};

const ACK_PREFIX: &[u8] = b"hookpay/ack";

fn ack_message(hash: &Hash) -> [u8; 43] {
    let mut msg = [0u8; 43];
    msg[..ACK_PREFIX.len()].copy_from_slice(ACK_PREFIX);
    msg[ACK_PREFIX.len()..].copy_from_slice(hash.as_bytes());
    msg
}

/// Verifying key for an acknowledgement secret.
pub fn ack_key_from_secret(secret: &PrivateKey) -> AckKey {
    AckKey(SigningKey::from_bytes(&secret.0).verifying_key().to_bytes())
}

/// Acknowledge a content hash.
pub fn sign_ack(secret: &PrivateKey, hash: &Hash) -> AckSignature {
    let signing_key = SigningKey::from_bytes(&secret.0);
    AckSignature(signing_key.sign(&ack_message(hash)).to_bytes())
}

/// Check an acknowledgement against the custodian's published key.
pub fn verify_ack(key: &AckKey, hash: &Hash, signature: &AckSignature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key.0) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(&ack_message(hash), &sig).is_ok()
}
