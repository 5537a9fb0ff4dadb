//! Entities exchanged with the settlement custodian.
//!
//! Every entity has a deterministic content hash computed with a distinct
//! domain-separation label. Hashes are what the custodian acknowledges and
//! what the local store keys rows by.

pub mod ack;
pub mod bounty;
pub mod claim;
pub mod custodian;
pub mod error;
pub mod hookin;
pub mod hookout;
pub mod transfer;

pub use ack::Acknowledged;
pub use bounty::Bounty;
pub use claim::{ClaimRequest, ClaimResponse, Claimable, ClaimedCoin, CoinRequest};
pub use custodian::{BitcoinReceive, CustodianInfo, FeeSchedule};
pub use error::SettlementError;
pub use hookin::Hookin;
pub use hookout::Hookout;
pub use transfer::Transfer;

use hookpay_types::Hash;
use rand::RngCore;

/// Anything with a canonical content hash.
pub trait Hashable {
    fn hash(&self) -> Hash;
}

/// A fresh random 32-byte nonce for bounties and hookouts.
pub fn fresh_nonce() -> Hash {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Hash::new(bytes)
}
