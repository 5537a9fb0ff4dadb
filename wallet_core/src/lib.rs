//! The hookpay wallet engine.
//!
//! A non-custodial wallet over a custodian that issues blind-signed coins.
//! Value enters as bitcoin deposits (hookins) or off-chain bounties, is
//! claimed into power-of-two coins whose owners the custodian never sees,
//! and leaves as transfers to other claimants or bitcoin payouts
//! (hookouts).
//!
//! Every key is derived from one seed; every fact lives in a
//! [`hookpay_store::Store`]. [`Wallet`] is the entry point.

pub mod balance;
mod claim;
pub mod config;
mod discovery;
mod engine;
pub mod error;
pub mod http;
pub mod keys;
pub mod keystore;
pub mod selector;
pub mod session;
pub mod settlement;
pub mod transfer;
pub mod wallet;
mod worker;

pub use claim::ClaimOutcome;
pub use config::WalletSettings;
pub use discovery::SyncReport;
pub use error::WalletError;
pub use http::HttpSettlement;
pub use keys::{KeyChain, Lineage};
pub use keystore::KdfParams;
pub use selector::{select_coins, Selection};
pub use settlement::{SettlementApi, SettlementResult};
pub use transfer::{hookout_fee, Destination, HOOKOUT_WEIGHT};
pub use wallet::{CreateOptions, Wallet};
