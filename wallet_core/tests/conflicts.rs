mod common;

use std::sync::Arc;

use common::{deposit, new_wallet, restored_wallet, stranger};
use hookpay_messages::SettlementError;
use hookpay_nullables::NullSettlement;
use hookpay_store::TransferStatus;
use hookpay_wallet_core::WalletError;

fn unavailable() -> SettlementError {
    SettlementError::new(503, "UNAVAILABLE", "maintenance")
}

/// Two copies of one wallet spend the same coins. The copy that loses the
/// race learns about the winning transfer when its own submission fails.
#[tokio::test]
async fn losing_copy_reconciles_the_winning_transfer() {
    let custodian = Arc::new(NullSettlement::new());
    let (alice, mnemonic) = new_wallet(&custodian).await;
    let bob = restored_wallet(&custodian, &mnemonic).await;

    deposit(&alice, &custodian, 0, 1_024);
    deposit(&alice, &custodian, 1, 1_024);
    alice.sync().await.unwrap();
    bob.sync().await.unwrap();
    assert_eq!(alice.list_unspent().unwrap(), bob.list_unspent().unwrap());
    assert_eq!(bob.balance().unwrap(), 2_048);

    custodian.fail_next_submit(unavailable());
    bob.send_direct(stranger(), 500).await.unwrap_err();
    custodian.fail_next_submit(unavailable());
    bob.send_direct(stranger(), 500).await.unwrap_err();
    let pending = bob.list_transfers().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.status.is_pending()));
    assert_ne!(
        pending[0].transfer.inputs[0].owner,
        pending[1].transfer.inputs[0].owner
    );

    let winner = alice.send_direct(stranger(), 1_948).await.unwrap();
    assert_eq!(winner.transfer.inputs.len(), 2);

    match bob.finalize_transfer(pending[0].hash).await {
        Err(WalletError::Settlement(e)) => assert!(e.is_input_spent()),
        other => panic!("expected INPUT_SPENT, got {other:?}"),
    }
    let first = bob.get_transfer(&pending[0].hash).unwrap().unwrap();
    assert!(first.status.is_conflicted());
    let learned = bob.get_transfer(&winner.hash).unwrap().unwrap();
    assert_eq!(learned.transfer, winner.transfer);
    assert!(matches!(learned.status, TransferStatus::Acknowledged(_)));

    match bob.finalize_transfer(pending[1].hash).await {
        Err(WalletError::Settlement(e)) => assert!(e.is_input_spent()),
        other => panic!("expected INPUT_SPENT, got {other:?}"),
    }

    let transfers = bob.list_transfers().unwrap();
    assert_eq!(transfers.len(), 3);
    assert_eq!(
        transfers.iter().filter(|r| r.hash == winner.hash).count(),
        1
    );
    assert_eq!(
        transfers.iter().filter(|r| r.status.is_conflicted()).count(),
        2
    );
    assert!(bob.list_unspent().unwrap().is_empty());
    assert_eq!(bob.balance().unwrap(), 0);
}

/// A copy that has not synced since the other copy spent its coin learns
/// about that spend from the conflict.
#[tokio::test]
async fn stale_copy_learns_the_earlier_spend() {
    let custodian = Arc::new(NullSettlement::new());
    let (alice, mnemonic) = new_wallet(&custodian).await;
    let bob = restored_wallet(&custodian, &mnemonic).await;
    deposit(&alice, &custodian, 0, 1_024);
    alice.sync().await.unwrap();
    bob.sync().await.unwrap();

    let record = alice.send_direct(stranger(), 400).await.unwrap();

    custodian.fail_next_submit(unavailable());
    bob.send_direct(stranger(), 400).await.unwrap_err();
    let stale = bob.list_transfers().unwrap()[0].clone();
    assert!(matches!(
        bob.finalize_transfer(stale.hash).await,
        Err(WalletError::Settlement(ref e)) if e.is_input_spent()
    ));
    assert!(bob.get_transfer(&record.hash).unwrap().is_some());
    assert_eq!(custodian.transfer(&record.hash).map(|t| t.contents), Some(record.transfer));
}

/// When the winning transfer cannot be fetched, the loser is still marked
/// conflicted and the next sync stores the winner.
#[tokio::test]
async fn failed_reconciliation_is_finished_by_sync() {
    let custodian = Arc::new(NullSettlement::new());
    let (alice, mnemonic) = new_wallet(&custodian).await;
    let bob = restored_wallet(&custodian, &mnemonic).await;
    deposit(&alice, &custodian, 0, 1_024);
    alice.sync().await.unwrap();
    bob.sync().await.unwrap();

    custodian.fail_next_submit(unavailable());
    bob.send_direct(stranger(), 500).await.unwrap_err();
    let stale = bob.list_transfers().unwrap()[0].hash;
    let winner = alice.send_direct(stranger(), 924).await.unwrap();

    custodian.fail_next_coin_lookup(unavailable());
    match bob.finalize_transfer(stale).await {
        Err(WalletError::Settlement(e)) => assert!(e.is_input_spent()),
        other => panic!("expected INPUT_SPENT, got {other:?}"),
    }
    assert!(bob.get_transfer(&stale).unwrap().unwrap().status.is_conflicted());
    assert!(bob.get_transfer(&winner.hash).unwrap().is_none());
    assert_eq!(bob.balance().unwrap(), 1_024);

    let report = bob.sync().await.unwrap();
    assert_eq!(report.new_transfers, 1);
    let learned = bob.get_transfer(&winner.hash).unwrap().unwrap();
    assert!(matches!(learned.status, TransferStatus::Acknowledged(_)));
    assert_eq!(bob.balance().unwrap(), 0);
}
