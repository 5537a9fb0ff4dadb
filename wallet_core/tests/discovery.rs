mod common;

use std::sync::Arc;

use common::{deposit, deposit_address, new_wallet, restored_wallet, stranger};
use hookpay_nullables::NullSettlement;
use hookpay_store::TransferStatus;

#[tokio::test]
async fn gap_limit_scan_stops_after_three_empty_addresses() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 5_000);
    deposit(&wallet, &custodian, 4, 3_000);

    let report = wallet.sync().await.unwrap();

    let expected_probes: Vec<String> = (0..=8)
        .map(|i| deposit_address(&wallet, &custodian, i))
        .collect();
    assert_eq!(custodian.receive_probes(), expected_probes);

    let indices: Vec<u32> = wallet
        .bitcoin_addresses()
        .unwrap()
        .iter()
        .map(|row| row.index)
        .collect();
    assert_eq!(indices, (0..=7).collect::<Vec<_>>());
    assert_eq!(report.new_bitcoin_addresses, 8);

    let hookins = wallet.list_hookins().unwrap();
    assert_eq!(hookins.len(), 2);
    let mut credited: Vec<String> = hookins.iter().map(|h| h.bitcoin_address.clone()).collect();
    credited.sort();
    let mut expected = vec![
        deposit_address(&wallet, &custodian, 0),
        deposit_address(&wallet, &custodian, 4),
    ];
    expected.sort();
    assert_eq!(credited, expected);

    assert_eq!(report.new_hookins, 2);
    assert_eq!(report.claimed, 2);
    assert_eq!(report.claim_failures, 0);
    assert_eq!(wallet.balance().unwrap(), 8_000);
}

#[tokio::test]
async fn resync_reprobes_known_addresses_and_one_more() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 5_000);
    deposit(&wallet, &custodian, 4, 3_000);
    wallet.sync().await.unwrap();
    custodian.clear_probes();

    let report = wallet.sync().await.unwrap();

    assert_eq!(custodian.receive_probes().len(), 9);
    assert_eq!(report.new_bitcoin_addresses, 0);
    assert_eq!(report.new_hookins, 0);
    assert_eq!(report.claimed, 0);
    assert_eq!(wallet.bitcoin_addresses().unwrap().len(), 8);
    assert_eq!(wallet.balance().unwrap(), 8_000);
}

#[tokio::test]
async fn later_deposit_to_a_known_address_is_found() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 1_000);
    wallet.sync().await.unwrap();

    deposit(&wallet, &custodian, 2, 24);
    let report = wallet.sync().await.unwrap();
    assert_eq!(report.new_hookins, 1);
    assert_eq!(wallet.balance().unwrap(), 1_024);
}

#[tokio::test]
async fn empty_wallet_persists_no_addresses() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    wallet.sync().await.unwrap();
    assert!(wallet.bitcoin_addresses().unwrap().is_empty());
    assert_eq!(custodian.receive_probes().len(), 4);
}

#[tokio::test]
async fn locked_sync_records_deposits_and_claims_after_unlock() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 1, 777);
    wallet.lock();

    let report = wallet.sync().await.unwrap();
    assert_eq!(report.new_hookins, 1);
    assert_eq!(report.claim_failures, 1);
    assert_eq!(wallet.balance().unwrap(), 0);

    wallet.unlock(common::PASSWORD).unwrap();
    let report = wallet.sync().await.unwrap();
    assert_eq!(report.new_hookins, 0);
    assert_eq!(report.claimed, 1);
    assert_eq!(wallet.balance().unwrap(), 777);
}

#[tokio::test]
async fn bounties_to_handed_out_addresses_are_discovered() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    let claimant = wallet.new_direct_address().await.unwrap();
    custodian.issue_bounty(claimant, 300);

    let report = wallet.sync().await.unwrap();
    assert_eq!(report.new_bounties, 1);
    assert_eq!(wallet.balance().unwrap(), 300);
}

#[tokio::test]
async fn restored_wallet_rediscovers_its_coins() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, mnemonic) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 4_096);
    deposit(&wallet, &custodian, 3, 100);
    let claimant = wallet.new_direct_address().await.unwrap();
    custodian.issue_bounty(claimant, 50);
    wallet.sync().await.unwrap();

    let restored = restored_wallet(&custodian, &mnemonic).await;
    restored.sync().await.unwrap();

    let mut original = wallet.list_coins().unwrap();
    let mut recovered = restored.list_coins().unwrap();
    original.sort_by_key(|c| c.owner);
    recovered.sort_by_key(|c| c.owner);
    assert_eq!(original, recovered);
    assert_eq!(restored.balance().unwrap(), 4_246);
}

#[tokio::test]
async fn restored_wallet_recovers_change_and_past_spends() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, mnemonic) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, 1_024);
    wallet.sync().await.unwrap();
    let sent = wallet.send_direct(stranger(), 500).await.unwrap();
    wallet.flush_background().await;
    assert_eq!(wallet.balance().unwrap(), 424);

    let restored = restored_wallet(&custodian, &mnemonic).await;
    let report = restored.sync().await.unwrap();

    assert_eq!(report.new_transfers, 1);
    assert_eq!(restored.balance().unwrap(), wallet.balance().unwrap());
    let change = wallet.direct_addresses(true).unwrap();
    let recovered_change = restored.direct_addresses(true).unwrap();
    assert_eq!(recovered_change.len(), 4);
    assert_eq!(recovered_change[0], change[0]);

    let learned = restored.get_transfer(&sent.hash).unwrap().unwrap();
    assert!(matches!(learned.status, TransferStatus::Acknowledged(_)));
    let mut original = wallet.list_unspent().unwrap();
    let mut recovered = restored.list_unspent().unwrap();
    original.sort_by_key(|c| c.owner);
    recovered.sort_by_key(|c| c.owner);
    assert_eq!(original, recovered);

    let again = restored.sync().await.unwrap();
    assert_eq!(again.new_transfers, 0);
    assert_eq!(restored.list_transfers().unwrap().len(), 1);
}

#[tokio::test]
async fn receives_above_the_supply_are_skipped() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    deposit(&wallet, &custodian, 0, u64::MAX);
    deposit(&wallet, &custodian, 1, 700);

    let report = wallet.sync().await.unwrap();

    assert_eq!(report.new_hookins, 1);
    assert_eq!(report.claim_failures, 0);
    assert_eq!(wallet.list_hookins().unwrap().len(), 1);
    assert_eq!(wallet.balance().unwrap(), 700);
    assert_eq!(custodian.claim_count(), 1);
}

#[tokio::test]
async fn bounties_above_the_supply_are_skipped() {
    let custodian = Arc::new(NullSettlement::new());
    let (wallet, _) = new_wallet(&custodian).await;
    let claimant = wallet.new_direct_address().await.unwrap();
    custodian.issue_bounty(claimant, u64::MAX);
    custodian.issue_bounty(claimant, 30);

    let report = wallet.sync().await.unwrap();

    assert_eq!(report.new_bounties, 1);
    assert_eq!(wallet.list_bounties().unwrap().len(), 1);
    assert_eq!(wallet.balance().unwrap(), 30);
}
