//! The wallet facade.
//!
//! A [`Wallet`] owns the engine and is what callers (the CLI, a UI) hold.
//! Reads go straight to the store. Commands that touch the custodian or
//! write more than one row take the engine's operation lock, so at most one
//! of them runs at a time per wallet.

use std::sync::Arc;

use hookpay_crypto::{generate_mnemonic, validate_mnemonic};
use hookpay_messages::{Bounty, Claimable, Hookin, Hookout};
use hookpay_store::record::CONFIG_KEY;
use hookpay_store::{
    BitcoinAddressRow, ConfigRow, DirectAddressRow, Listener, ReadOps, Store, StoredCoin,
    SubscriptionId, Topic, TransferRecord,
};
use hookpay_types::{Hash, PublicKey, Timestamp};
use tracing::info;
use zeroize::Zeroizing;

use crate::balance;
use crate::claim::ClaimOutcome;
use crate::config::DEFAULT_GAP_LIMIT;
use crate::discovery::SyncReport;
use crate::engine::{append_direct_address, bitcoin_address_row, next_bitcoin_index, Engine};
use crate::error::WalletError;
use crate::keys::{KeyChain, Lineage};
use crate::keystore::{decrypt_keystore, encrypt_keystore, KdfParams, KeystoreFile};
use crate::settlement::SettlementApi;
use crate::transfer::Destination;

/// Parameters fixed at wallet creation.
#[derive(Clone, Debug)]
pub struct CreateOptions {
    pub gap_limit: u32,
    /// Recorded in the config row for display; requests go through the
    /// [`SettlementApi`] the wallet was built with.
    pub api_base: String,
    pub kdf: KdfParams,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            gap_limit: DEFAULT_GAP_LIMIT,
            api_base: String::new(),
            kdf: KdfParams::default(),
        }
    }
}

pub struct Wallet {
    engine: Arc<Engine>,
}

impl Wallet {
    /// Create a wallet from a fresh mnemonic. Returns the wallet, unlocked,
    /// and the mnemonic to show the user once.
    pub async fn create(
        store: Arc<Store>,
        api: Arc<dyn SettlementApi>,
        password: &str,
        options: CreateOptions,
    ) -> Result<(Self, Zeroizing<String>), WalletError> {
        let mnemonic = Zeroizing::new(generate_mnemonic()?);
        let wallet = Self::initialize(store, api, &mnemonic, password, options).await?;
        Ok((wallet, mnemonic))
    }

    /// Recreate a wallet from its mnemonic. Run [`Wallet::sync`] afterwards
    /// to rediscover its funds.
    pub async fn restore(
        store: Arc<Store>,
        api: Arc<dyn SettlementApi>,
        mnemonic: &str,
        password: &str,
        options: CreateOptions,
    ) -> Result<Self, WalletError> {
        let mnemonic = mnemonic.trim();
        if !validate_mnemonic(mnemonic) {
            return Err(WalletError::InvalidMnemonic(
                "not a valid BIP39 mnemonic".into(),
            ));
        }
        Self::initialize(store, api, mnemonic, password, options).await
    }

    async fn initialize(
        store: Arc<Store>,
        api: Arc<dyn SettlementApi>,
        mnemonic: &str,
        password: &str,
        options: CreateOptions,
    ) -> Result<Self, WalletError> {
        if store.contains::<ConfigRow>(CONFIG_KEY)? {
            return Err(WalletError::AlreadyInitialized);
        }
        let keys = KeyChain::from_mnemonic(mnemonic, "")?;
        let custodian = api.custodian_info().await?;
        let keystore = encrypt_keystore(&keys.secret_bytes(), password, options.kdf)?;

        let config = ConfigRow {
            bitcoin_generator: keys.generator(Lineage::Bitcoin).public(),
            internal_generator: keys.generator(Lineage::Internal).public(),
            external_generator: keys.generator(Lineage::External).public(),
            keystore: keystore.to_json()?,
            gap_limit: options.gap_limit,
            api_base: options.api_base,
            custodian,
            created: Timestamp::now(),
        };
        let inserted = store.transact(|txn| -> Result<bool, WalletError> {
            Ok(txn.insert_if_absent(&config)?)
        })?;
        if !inserted {
            return Err(WalletError::AlreadyInitialized);
        }
        info!(network = config.custodian.network.as_str(), "wallet initialized");

        let engine = Engine::start(store, api);
        engine.session.unlock(keys);
        Ok(Self { engine })
    }

    /// Open an existing wallet, locked.
    pub async fn open(store: Arc<Store>, api: Arc<dyn SettlementApi>) -> Result<Self, WalletError> {
        if !store.contains::<ConfigRow>(CONFIG_KEY)? {
            return Err(WalletError::NotInitialized);
        }
        Ok(Self {
            engine: Engine::start(store, api),
        })
    }

    // ── Session ────────────────────────────────────────────────────────

    pub fn unlock(&self, password: &str) -> Result<(), WalletError> {
        let config = self.engine.config()?;
        let keystore = KeystoreFile::from_json(&config.keystore)?;
        let secret = decrypt_keystore(&keystore, password)?;
        let keys = KeyChain::from_secret_bytes(&secret)?;
        if keys.generator(Lineage::Bitcoin).public() != config.bitcoin_generator {
            return Err(WalletError::Keystore(
                "keystore does not belong to this wallet".into(),
            ));
        }
        self.engine.session.unlock(keys);
        Ok(())
    }

    pub fn lock(&self) {
        self.engine.session.lock();
    }

    pub fn is_unlocked(&self) -> bool {
        self.engine.session.is_unlocked()
    }

    pub fn mnemonic(&self) -> Result<Zeroizing<String>, WalletError> {
        Ok(Zeroizing::new(self.engine.keys()?.mnemonic().to_string()))
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn store(&self) -> &Store {
        &self.engine.store
    }

    pub fn config(&self) -> Result<ConfigRow, WalletError> {
        self.engine.config()
    }

    pub fn balance(&self) -> Result<u64, WalletError> {
        Ok(balance::balance(self.store())?)
    }

    pub fn list_unspent(&self) -> Result<Vec<StoredCoin>, WalletError> {
        Ok(balance::unspent_coins(self.store())?)
    }

    pub fn list_coins(&self) -> Result<Vec<StoredCoin>, WalletError> {
        Ok(self.store().list()?)
    }

    /// Every transfer, oldest first.
    pub fn list_transfers(&self) -> Result<Vec<TransferRecord>, WalletError> {
        let mut transfers: Vec<TransferRecord> = self.store().list()?;
        transfers.sort_by_key(|t| t.created);
        Ok(transfers)
    }

    pub fn get_transfer(&self, hash: &Hash) -> Result<Option<TransferRecord>, WalletError> {
        Ok(self.store().get(&hash.0)?)
    }

    pub fn list_bounties(&self) -> Result<Vec<Bounty>, WalletError> {
        Ok(self.store().list()?)
    }

    pub fn list_hookins(&self) -> Result<Vec<Hookin>, WalletError> {
        Ok(self.store().list()?)
    }

    pub fn list_hookouts(&self) -> Result<Vec<Hookout>, WalletError> {
        Ok(self.store().list()?)
    }

    /// Deposit addresses in derivation order.
    pub fn bitcoin_addresses(&self) -> Result<Vec<BitcoinAddressRow>, WalletError> {
        Ok(self.store().list()?)
    }

    /// Direct addresses of one lineage in derivation order.
    pub fn direct_addresses(&self, internal: bool) -> Result<Vec<DirectAddressRow>, WalletError> {
        crate::engine::direct_addresses(self.store(), internal)
    }

    pub fn is_claimed(&self, claim_hash: &Hash) -> Result<bool, WalletError> {
        self.engine.is_claimed(claim_hash)
    }

    pub fn subscribe(&self, topic: Topic, listener: Listener) -> SubscriptionId {
        self.engine.store.subscribe(topic, listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.engine.store.unsubscribe(id)
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// Hand out the next external claimant key for receiving off-chain.
    pub async fn new_direct_address(&self) -> Result<PublicKey, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        let config = self.engine.config()?;
        let row = self
            .engine
            .store
            .transact(|txn| append_direct_address(txn, &config, false))?;
        info!(index = row.index, claimant = %row.claimant, "new direct address");
        Ok(row.claimant)
    }

    /// Hand out the next bitcoin deposit address.
    pub async fn new_bitcoin_address(&self) -> Result<BitcoinAddressRow, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        let config = self.engine.config()?;
        let row = self
            .engine
            .store
            .transact(|txn| -> Result<BitcoinAddressRow, WalletError> {
                let row = bitcoin_address_row(&config, next_bitcoin_index(&*txn)?)?;
                txn.put(&row)?;
                Ok(row)
            })?;
        info!(index = row.index, address = %row.address, "new bitcoin address");
        Ok(row)
    }

    /// Pay `amount` to a claimant key off-chain.
    pub async fn send_direct(
        &self,
        claimant: PublicKey,
        amount: u64,
    ) -> Result<TransferRecord, WalletError> {
        self.send(Destination::Direct(claimant), amount).await
    }

    /// Pay `amount` out to a bitcoin address. `fee_rate` is in sat/vbyte;
    /// zero queues a free batched payout.
    pub async fn send_to_bitcoin_address(
        &self,
        address: &str,
        amount: u64,
        fee_rate: u64,
    ) -> Result<TransferRecord, WalletError> {
        let destination = Destination::Bitcoin {
            address: address.to_string(),
            fee_rate,
        };
        self.send(destination, amount).await
    }

    async fn send(
        &self,
        destination: Destination,
        amount: u64,
    ) -> Result<TransferRecord, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        let record = self.engine.build_transfer(destination, amount)?;
        self.engine.finalize_transfer(record.hash).await
    }

    /// Retry submitting a pending transfer.
    pub async fn finalize_transfer(&self, hash: Hash) -> Result<TransferRecord, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        self.engine.finalize_transfer(hash).await
    }

    /// Abandon a pending transfer, freeing its inputs.
    pub async fn discard_transfer(&self, hash: Hash) -> Result<TransferRecord, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        self.engine.discard_transfer(hash)
    }

    /// Claim a bounty or hookin addressed to one of this wallet's claimants.
    pub async fn claim(&self, claimable: Claimable) -> Result<ClaimOutcome, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        self.engine.claim_claimable(claimable).await
    }

    /// Discover deposits and bounties, then claim everything unclaimed.
    pub async fn sync(&self) -> Result<SyncReport, WalletError> {
        let _guard = self.engine.op_lock.lock().await;
        self.engine.sync().await
    }

    /// Wait for queued self-claims to finish.
    pub async fn flush_background(&self) {
        self.engine.self_claims.flush().await;
    }
}
