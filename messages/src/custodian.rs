use hookpay_types::{AckKey, Magnitude, Network, PublicKey};
use serde::{Deserialize, Serialize};

/// Fees charged by the custodian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee for an off-chain send.
    pub direct: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { direct: 100 }
    }
}

/// The custodian's public parameters, fetched once at wallet creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianInfo {
    /// Blind signer key per magnitude, indexed by exponent.
    pub blind_coin_keys: Vec<PublicKey>,
    pub ack_key: AckKey,
    /// Compressed secp256k1 key (hex) that deposit addresses pay to.
    pub funding_key: String,
    pub fees: FeeSchedule,
    pub network: Network,
}

impl CustodianInfo {
    pub fn signer_key(&self, magnitude: Magnitude) -> Option<&PublicKey> {
        self.blind_coin_keys.get(magnitude.index())
    }
}

/// A bitcoin output received at a deposit address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinReceive {
    pub txid: String,
    pub vout: u32,
    pub amount: u64,
}
