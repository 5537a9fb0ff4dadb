mod common;

use std::sync::Arc;

use common::{deposit, new_wallet, stranger};
use hookpay_messages::{Hashable, SettlementError, Transfer};
use hookpay_nullables::NullSettlement;
use hookpay_store::TransferStatus;
use hookpay_types::{Hash, MAX_MONEY};
use hookpay_wallet_core::{hookout_fee, Wallet, WalletError};

/// A wallet holding a single 1024 coin from a deposit.
async fn funded() -> (Arc<NullSettlement>, Wallet) {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 1_024);
    wallet.sync().await.unwrap();
    assert_eq!(wallet.list_unspent().unwrap().len(), 1);
    (custodian, wallet)
}

fn unavailable() -> SettlementError {
    SettlementError::new(503, "UNAVAILABLE", "maintenance")
}

#[tokio::test]
async fn direct_send_is_acknowledged_and_change_is_self_claimed() {
    let (custodian, wallet) = funded().await;
    let record = wallet.send_direct(stranger(), 500).await.unwrap();

    assert!(matches!(record.status, TransferStatus::Acknowledged(_)));
    assert!(custodian.transfer(&record.hash).is_some());
    assert_eq!(record.transfer.fee(), Some(100));
    assert_eq!(record.transfer.outputs.len(), 2);
    assert_eq!(wallet.direct_addresses(true).unwrap().len(), 1);

    wallet.flush_background().await;
    assert_eq!(wallet.balance().unwrap(), 424);
}

#[tokio::test]
async fn stored_transfer_hash_recomputes() {
    let (_custodian, wallet) = funded().await;
    let record = wallet.send_direct(stranger(), 300).await.unwrap();
    let stored = wallet.get_transfer(&record.hash).unwrap().unwrap();

    assert!(stored.transfer.is_canonical());
    assert_eq!(stored.transfer.hash(), stored.hash);
    assert_eq!(
        Transfer::commitment(
            &stored.transfer.inputs,
            &stored.transfer.outputs,
            stored.transfer.hookout.as_ref()
        ),
        stored.hash
    );
    assert!(stored.transfer.verify_authorization());
}

#[tokio::test]
async fn pending_inputs_are_reserved_until_discarded() {
    let (custodian, wallet) = funded().await;
    custodian.fail_next_submit(unavailable());

    let err = wallet.send_direct(stranger(), 500).await.unwrap_err();
    assert!(matches!(err, WalletError::Settlement(ref e) if e.status == 503));

    let transfers = wallet.list_transfers().unwrap();
    assert_eq!(transfers.len(), 1);
    let pending = &transfers[0];
    assert!(pending.status.is_pending());
    assert!(wallet.list_unspent().unwrap().is_empty());
    assert_eq!(wallet.balance().unwrap(), 0);

    let discarded = wallet.discard_transfer(pending.hash).await.unwrap();
    assert!(discarded.status.is_conflicted());
    assert_eq!(wallet.list_unspent().unwrap().len(), 1);
    assert_eq!(wallet.balance().unwrap(), 1_024);
}

#[tokio::test]
async fn pending_transfer_can_be_finalized_later() {
    let (custodian, wallet) = funded().await;
    custodian.fail_next_submit(unavailable());
    wallet.send_direct(stranger(), 500).await.unwrap_err();
    let hash = wallet.list_transfers().unwrap()[0].hash;

    let record = wallet.finalize_transfer(hash).await.unwrap();
    assert!(matches!(record.status, TransferStatus::Acknowledged(_)));
    assert!(wallet.list_unspent().unwrap().is_empty());
}

#[tokio::test]
async fn acknowledged_inputs_stay_spent() {
    let (_custodian, wallet) = funded().await;
    let record = wallet.send_direct(stranger(), 924).await.unwrap();
    assert_eq!(record.transfer.outputs.len(), 1);
    wallet.flush_background().await;
    assert!(wallet.list_unspent().unwrap().is_empty());
    assert_eq!(wallet.balance().unwrap(), 0);

    match wallet.discard_transfer(record.hash).await {
        Err(WalletError::InvalidTransferState { hash, status }) => {
            assert_eq!(hash, record.hash);
            assert!(matches!(status, TransferStatus::Acknowledged(_)));
        }
        other => panic!("expected InvalidTransferState, got {other:?}"),
    }
    assert!(matches!(
        wallet.finalize_transfer(record.hash).await,
        Err(WalletError::InvalidTransferState { .. })
    ));
}

#[tokio::test]
async fn unknown_transfers_cannot_be_finalized() {
    let (_custodian, wallet) = funded().await;
    let missing = Hash::new([7; 32]);
    assert!(matches!(
        wallet.finalize_transfer(missing).await,
        Err(WalletError::TransferNotFound(h)) if h == missing
    ));
}

#[tokio::test]
async fn overspending_reports_insufficient_funds() {
    let (_custodian, wallet) = funded().await;
    match wallet.send_direct(stranger(), 1_000).await {
        Err(WalletError::InsufficientFunds { needed, available }) => {
            assert_eq!(needed, 1_100);
            assert_eq!(available, 1_024);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
    assert!(wallet.list_transfers().unwrap().is_empty());
    assert!(matches!(
        wallet.send_direct(stranger(), 0).await,
        Err(WalletError::InvalidAmount(0))
    ));
    assert!(matches!(
        wallet.send_direct(stranger(), u64::MAX).await,
        Err(WalletError::InvalidAmount(a)) if a == u64::MAX
    ));
    assert!(matches!(
        wallet.send_direct(stranger(), MAX_MONEY + 1).await,
        Err(WalletError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn sending_needs_the_seed() {
    let (_custodian, wallet) = funded().await;
    wallet.lock();
    assert!(matches!(
        wallet.send_direct(stranger(), 10).await,
        Err(WalletError::Locked)
    ));
}

#[tokio::test]
async fn hookout_pays_the_weight_fee() {
    let (custodian, wallet) = funded().await;
    let address = custodian.deposit_address_for(&stranger());

    let record = wallet
        .send_to_bitcoin_address(&address, 600, 2)
        .await
        .unwrap();
    let hookout = record.transfer.hookout.clone().unwrap();
    assert_eq!(hookout.amount, 600);
    assert_eq!(hookout.bitcoin_address, address);
    assert!(hookout.fee_included);
    assert_eq!(record.transfer.fee(), Some(hookout_fee(2)));
    assert_eq!(wallet.list_hookouts().unwrap(), vec![hookout]);

    wallet.flush_background().await;
    assert_eq!(wallet.balance().unwrap(), 1_024 - 600 - hookout_fee(2));
}

#[tokio::test]
async fn free_hookout_is_batched() {
    let (custodian, wallet) = funded().await;
    let address = custodian.deposit_address_for(&stranger());
    let record = wallet.send_to_bitcoin_address(&address, 1_024, 0).await.unwrap();
    let hookout = record.transfer.hookout.as_ref().unwrap();
    assert!(!hookout.fee_included);
    assert_eq!(record.transfer.fee(), Some(0));
}

#[tokio::test]
async fn hookout_to_a_bad_address_is_refused() {
    let (_custodian, wallet) = funded().await;
    assert!(matches!(
        wallet.send_to_bitcoin_address("not-an-address", 100, 1).await,
        Err(WalletError::InvalidAddress(_))
    ));
    assert!(wallet.list_transfers().unwrap().is_empty());
}

#[tokio::test]
async fn payment_between_wallets() {
    let custodian = Arc::new(NullSettlement::new());
    let (alice, _) = new_wallet(&custodian).await;
    let (bob, _) = new_wallet(&custodian).await;
    deposit(&alice, &custodian, 0, 2_048);
    alice.sync().await.unwrap();

    let bob_claimant = bob.new_direct_address().await.unwrap();
    alice.send_direct(bob_claimant, 1_000).await.unwrap();

    let report = bob.sync().await.unwrap();
    assert_eq!(report.new_bounties, 1);
    assert_eq!(bob.balance().unwrap(), 1_000);

    alice.flush_background().await;
    assert_eq!(alice.balance().unwrap(), 948);
}
