//! Content hashes.

use crate::bytes::impl_fixed_bytes;

/// A 32-byte content hash.
///
/// Every stored entity (bounty, hookin, hookout, coin, claim, transfer) is
/// addressed by a domain-separated hash of its content.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; 32]);

impl_fixed_bytes!(Hash, 32);

impl Hash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_full_hex() {
        let hash = Hash::new([0xab; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(32));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("abcd".parse::<Hash>().is_err());
        assert!("zz".repeat(32).parse::<Hash>().is_err());
    }

    #[test]
    fn json_uses_hex_string() {
        let hash = Hash::new([1u8; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn bincode_uses_raw_bytes() {
        let hash = Hash::new([7u8; 32]);
        let encoded = bincode::serialize(&hash).unwrap();
        // u64 length prefix + 32 bytes
        assert_eq!(encoded.len(), 40);
        let back: Hash = bincode::deserialize(&encoded).unwrap();
        assert_eq!(back, hash);
    }
}
