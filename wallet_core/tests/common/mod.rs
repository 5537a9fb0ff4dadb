#![allow(dead_code)]

use std::sync::Arc;

use hookpay_crypto::{public_from_private, random_private_key};
use hookpay_nullables::NullSettlement;
use hookpay_store::Store;
use hookpay_types::PublicKey;
use hookpay_wallet_core::keys::derive_public;
use hookpay_wallet_core::{CreateOptions, KdfParams, SettlementApi, Wallet};
use zeroize::Zeroizing;

pub const PASSWORD: &str = "correct horse battery staple";

pub fn options() -> CreateOptions {
    CreateOptions {
        gap_limit: 3,
        api_base: "null://custodian".into(),
        kdf: KdfParams::light(),
    }
}

pub fn api(custodian: &Arc<NullSettlement>) -> Arc<dyn SettlementApi> {
    custodian.clone()
}

pub async fn new_wallet(custodian: &Arc<NullSettlement>) -> (Wallet, Zeroizing<String>) {
    Wallet::create(Arc::new(Store::in_memory()), api(custodian), PASSWORD, options())
        .await
        .unwrap()
}

pub async fn restored_wallet(custodian: &Arc<NullSettlement>, mnemonic: &str) -> Wallet {
    Wallet::restore(
        Arc::new(Store::in_memory()),
        api(custodian),
        mnemonic,
        PASSWORD,
        options(),
    )
    .await
    .unwrap()
}

/// The deposit address at bitcoin index `index` of `wallet`.
pub fn deposit_address(wallet: &Wallet, custodian: &NullSettlement, index: u32) -> String {
    let config = wallet.config().unwrap();
    let claimant = derive_public(&config.bitcoin_generator, index).unwrap();
    custodian.deposit_address_for(&claimant)
}

/// Pay `amount` on-chain to `wallet`'s deposit index `index`.
pub fn deposit(wallet: &Wallet, custodian: &NullSettlement, index: u32, amount: u64) {
    custodian.add_receive(&deposit_address(wallet, custodian, index), amount);
}

pub fn stranger() -> PublicKey {
    public_from_private(&random_private_key())
}
