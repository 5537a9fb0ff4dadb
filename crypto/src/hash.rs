//! Blake2b hashing with domain separation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};
use hmac::{Hmac, Mac};
use hookpay_types::Hash;
use sha2::Sha512;

type Blake2b256 = Blake2b<U32>;
type HmacSha512 = Hmac<Sha512>;

/// Content hash under a domain-separation label.
///
/// The label and every part are length-prefixed, so `("ab", "c")` and
/// `("a", "bc")` never collide and no two labels share a hash space.
pub fn hash_labeled(label: &str, parts: &[&[u8]]) -> Hash {
    let mut hasher = Blake2b256::new();
    absorb_labeled(&mut hasher, label, parts);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    Hash::new(output)
}

/// 512-bit variant of [`hash_labeled`], used for wide scalar reduction.
pub(crate) fn hash_labeled_wide(label: &str, parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    absorb_labeled(&mut hasher, label, parts);
    let mut output = [0u8; 64];
    output.copy_from_slice(&hasher.finalize());
    output
}

fn absorb_labeled<D: Digest>(hasher: &mut D, label: &str, parts: &[&[u8]]) {
    hasher.update((label.len() as u64).to_le_bytes());
    hasher.update(label.as_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
}

/// HMAC-SHA512 keyed by `key` over `data`.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha512::new_from_slice(key).unwrap_or_else(|_| unreachable!());
    mac.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}
