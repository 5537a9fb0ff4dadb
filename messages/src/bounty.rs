use hookpay_crypto::hash_labeled;
use hookpay_types::{Hash, PublicKey};
use serde::{Deserialize, Serialize};

use crate::{fresh_nonce, Hashable};

/// A claimable unit of value addressed to a claimant key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    pub amount: u64,
    pub claimant: PublicKey,
    pub nonce: Hash,
}

impl Bounty {
    /// A bounty with a fresh random nonce.
    pub fn new(amount: u64, claimant: PublicKey) -> Self {
        Self {
            amount,
            claimant,
            nonce: fresh_nonce(),
        }
    }
}

impl Hashable for Bounty {
    fn hash(&self) -> Hash {
        hash_labeled(
            "bounty",
            &[
                &self.amount.to_le_bytes(),
                self.claimant.as_bytes(),
                self.nonce.as_bytes(),
            ],
        )
    }
}
