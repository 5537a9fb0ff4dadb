//! The settlement custodian as the engine sees it.

use async_trait::async_trait;
use hookpay_messages::{
    Acknowledged, BitcoinReceive, Bounty, ClaimRequest, ClaimResponse, CustodianInfo,
    SettlementError, Transfer,
};
use hookpay_types::{AckSignature, Hash, PublicKey};

pub type SettlementResult<T> = Result<T, SettlementError>;

/// Request/response access to the custodian.
///
/// Implementations report failures as structured [`SettlementError`]s;
/// lookups answer `None` for unknown keys rather than failing.
#[async_trait]
pub trait SettlementApi: Send + Sync {
    async fn custodian_info(&self) -> SettlementResult<CustodianInfo>;

    /// Fresh signer nonces, one per coin about to be requested.
    async fn gen_nonces(&self, count: usize) -> SettlementResult<Vec<PublicKey>>;

    async fn claim(&self, request: &ClaimRequest) -> SettlementResult<Acknowledged<ClaimResponse>>;

    async fn submit_transfer(&self, transfer: &Transfer) -> SettlementResult<AckSignature>;

    /// Hash of the transfer that spent the coin owned by `owner`, if any.
    async fn lookup_coin(&self, owner: &PublicKey) -> SettlementResult<Option<Hash>>;

    async fn lookup_transfer(&self, hash: &Hash)
        -> SettlementResult<Option<Acknowledged<Transfer>>>;

    async fn lookup_bounties(&self, claimant: &PublicKey) -> SettlementResult<Vec<Bounty>>;

    async fn fetch_bitcoin_receives(&self, address: &str)
        -> SettlementResult<Vec<BitcoinReceive>>;
}
