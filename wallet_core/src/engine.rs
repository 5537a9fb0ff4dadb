//! Shared engine state.
//!
//! The [`Wallet`](crate::Wallet) facade, the self-claim worker and the
//! protocol modules (`claim`, `discovery`, `transfer`) all operate on one
//! `Engine`. Top-level operations hold `op_lock` for their whole duration
//! so the wallet never runs two conflicting operations at once.

use std::sync::Arc;

use hookpay_crypto::deposit_address;
use hookpay_store::record::CONFIG_KEY;
use hookpay_store::{
    BitcoinAddressRow, ConfigRow, DirectAddressRow, Index, ReadOps, Store, WriteTxn,
};
use hookpay_types::PublicKey;
use tokio::sync::Mutex;

use crate::error::WalletError;
use crate::keys::{derive_public, KeyChain, Lineage};
use crate::session::Session;
use crate::settlement::SettlementApi;
use crate::worker::SelfClaimQueue;

pub struct Engine {
    pub(crate) store: Arc<Store>,
    pub(crate) api: Arc<dyn SettlementApi>,
    pub(crate) session: Session,
    pub(crate) op_lock: Mutex<()>,
    pub(crate) self_claims: SelfClaimQueue,
}

impl Engine {
    /// Build the engine and start its self-claim worker.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(store: Arc<Store>, api: Arc<dyn SettlementApi>) -> Arc<Self> {
        let (self_claims, jobs) = SelfClaimQueue::new();
        let engine = Arc::new(Self {
            store,
            api,
            session: Session::new(),
            op_lock: Mutex::new(()),
            self_claims,
        });
        crate::worker::spawn(Arc::downgrade(&engine), jobs);
        engine
    }

    pub(crate) fn keys(&self) -> Result<Arc<KeyChain>, WalletError> {
        self.session.keys()
    }

    pub(crate) fn config(&self) -> Result<ConfigRow, WalletError> {
        self.store
            .get::<ConfigRow>(CONFIG_KEY)?
            .ok_or(WalletError::NotInitialized)
    }
}

pub(crate) fn generator(config: &ConfigRow, lineage: Lineage) -> &PublicKey {
    match lineage {
        Lineage::Bitcoin => &config.bitcoin_generator,
        Lineage::Internal => &config.internal_generator,
        Lineage::External => &config.external_generator,
    }
}

/// The deposit address row for bitcoin index `index`. Needs no seed.
pub(crate) fn bitcoin_address_row(
    config: &ConfigRow,
    index: u32,
) -> Result<BitcoinAddressRow, WalletError> {
    let claimant = derive_public(&config.bitcoin_generator, index)?;
    let address = deposit_address(
        &claimant,
        &config.custodian.funding_key,
        config.custodian.network,
    )?;
    Ok(BitcoinAddressRow {
        address,
        index,
        claimant,
    })
}

fn lineage_prefix(internal: bool) -> [u8; 1] {
    [internal as u8]
}

/// Next unused direct-address index in a lineage.
pub(crate) fn next_direct_index<R: ReadOps>(
    reader: &R,
    internal: bool,
) -> Result<u32, WalletError> {
    let last: Option<DirectAddressRow> =
        reader.find_last(Index::DirectAddressByLineage, &lineage_prefix(internal))?;
    Ok(last.map_or(0, |row| row.index + 1))
}

/// Derive and store the next direct address of a lineage.
pub(crate) fn append_direct_address(
    txn: &mut WriteTxn<'_>,
    config: &ConfigRow,
    internal: bool,
) -> Result<DirectAddressRow, WalletError> {
    let index = next_direct_index(&*txn, internal)?;
    let lineage = if internal {
        Lineage::Internal
    } else {
        Lineage::External
    };
    let row = DirectAddressRow {
        claimant: derive_public(generator(config, lineage), index)?,
        index,
        internal,
    };
    txn.put(&row)?;
    Ok(row)
}

pub(crate) fn direct_addresses<R: ReadOps>(
    reader: &R,
    internal: bool,
) -> Result<Vec<DirectAddressRow>, WalletError> {
    Ok(reader.find(Index::DirectAddressByLineage, &lineage_prefix(internal))?)
}

/// Next unused bitcoin deposit index.
pub(crate) fn next_bitcoin_index<R: ReadOps>(reader: &R) -> Result<u32, WalletError> {
    let rows: Vec<BitcoinAddressRow> = reader.list()?;
    Ok(rows.last().map_or(0, |row| row.index + 1))
}
