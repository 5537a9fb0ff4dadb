//! Row types that only exist in the local store.

use hookpay_messages::{Acknowledged, ClaimResponse, ClaimedCoin, CustodianInfo, Hashable, Transfer};
use hookpay_types::{AckSignature, Hash, Magnitude, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wallet-wide singleton written once at creation or restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub bitcoin_generator: PublicKey,
    pub internal_generator: PublicKey,
    pub external_generator: PublicKey,
    /// Encrypted mnemonic and seed (JSON keystore document).
    pub keystore: String,
    pub gap_limit: u32,
    pub api_base: String,
    pub custodian: CustodianInfo,
    pub created: Timestamp,
}

/// A derived bitcoin deposit address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinAddressRow {
    pub address: String,
    pub index: u32,
    pub claimant: PublicKey,
}

/// A derived claimant key for off-chain bounties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectAddressRow {
    pub claimant: PublicKey,
    pub index: u32,
    /// Change addresses are internal; addresses handed out are external.
    pub internal: bool,
}

/// A coin held by this wallet.
///
/// The owner's private key is never stored: it is re-derived from
/// `(claim_hash, blinding_nonce)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCoin {
    pub owner: PublicKey,
    pub magnitude: Magnitude,
    pub existence_proof: Signature,
    pub claim_hash: Hash,
    pub blinding_nonce: PublicKey,
}

impl StoredCoin {
    pub fn claimed(&self) -> ClaimedCoin {
        ClaimedCoin {
            owner: self.owner,
            magnitude: self.magnitude,
            existence_proof: self.existence_proof,
        }
    }

    pub fn amount(&self) -> u64 {
        self.magnitude.amount()
    }
}

impl Hashable for StoredCoin {
    fn hash(&self) -> Hash {
        self.claimed().hash()
    }
}

/// Presence of a claim record means the claimable was converted.
pub type ClaimRecord = Acknowledged<ClaimResponse>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Acknowledged(AckSignature),
    Conflicted,
}

impl TransferStatus {
    pub fn code(&self) -> u8 {
        match self {
            TransferStatus::Pending => 0,
            TransferStatus::Acknowledged(_) => 1,
            TransferStatus::Conflicted => 2,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TransferStatus::Pending)
    }

    pub fn is_conflicted(&self) -> bool {
        matches!(self, TransferStatus::Conflicted)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Acknowledged(_) => "acknowledged",
            TransferStatus::Conflicted => "conflicted",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transfer: Transfer,
    /// Commitment hash computed at creation.
    pub hash: Hash,
    pub status: TransferStatus,
    pub created: Timestamp,
}

impl TransferRecord {
    pub fn new(transfer: Transfer, status: TransferStatus) -> Self {
        Self {
            hash: transfer.hash(),
            transfer,
            status,
            created: Timestamp::now(),
        }
    }

    pub fn input_hashes(&self) -> Vec<Hash> {
        self.transfer.inputs.iter().map(Hashable::hash).collect()
    }
}
