use hookpay_crypto::hash_labeled;
use hookpay_types::{Hash, PublicKey};
use serde::{Deserialize, Serialize};

use crate::Hashable;

/// A bitcoin deposit credited to a claimant.
///
/// Exactly one hookin exists per `(txid, vout)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hookin {
    pub txid: String,
    pub vout: u32,
    pub amount: u64,
    pub claimant: PublicKey,
    pub bitcoin_address: String,
}

impl Hashable for Hookin {
    fn hash(&self) -> Hash {
        hash_labeled(
            "hookin",
            &[
                self.txid.as_bytes(),
                &self.vout.to_le_bytes(),
                &self.amount.to_le_bytes(),
                self.claimant.as_bytes(),
                self.bitcoin_address.as_bytes(),
            ],
        )
    }
}
