use hookpay_crypto::hash_labeled;
use hookpay_types::Hash;
use serde::{Deserialize, Serialize};

use crate::{fresh_nonce, Hashable};

/// A payout to an external bitcoin address.
///
/// `fee_included` marks a hookout whose transfer pays an on-chain fee for
/// immediate broadcast; free hookouts are batched by the custodian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hookout {
    pub amount: u64,
    pub bitcoin_address: String,
    pub fee_included: bool,
    pub nonce: Hash,
}

impl Hookout {
    pub fn new(amount: u64, bitcoin_address: String, fee_included: bool) -> Self {
        Self {
            amount,
            bitcoin_address,
            fee_included,
            nonce: fresh_nonce(),
        }
    }
}

impl Hashable for Hookout {
    fn hash(&self) -> Hash {
        hash_labeled(
            "hookout",
            &[
                &self.amount.to_le_bytes(),
                self.bitcoin_address.as_bytes(),
                &[self.fee_included as u8],
                self.nonce.as_bytes(),
            ],
        )
    }
}
