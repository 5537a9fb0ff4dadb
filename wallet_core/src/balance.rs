//! Spendable coins and balance.
//!
//! A coin is unspent unless some transfer that is not conflicted names it as
//! an input. Pending transfers reserve their inputs; only a conflict returns
//! them to the pool.

use hookpay_messages::Hashable;
use hookpay_store::{Index, ReadOps, StoreError, StoredCoin, TransferRecord};

pub fn is_spent<R: ReadOps>(reader: &R, coin: &StoredCoin) -> Result<bool, StoreError> {
    let spenders: Vec<TransferRecord> = reader.find(Index::TransferByCoin, &coin.hash().0)?;
    Ok(spenders.iter().any(|t| !t.status.is_conflicted()))
}

pub fn unspent_coins<R: ReadOps>(reader: &R) -> Result<Vec<StoredCoin>, StoreError> {
    let mut unspent = Vec::new();
    for coin in reader.list::<StoredCoin>()? {
        if !is_spent(reader, &coin)? {
            unspent.push(coin);
        }
    }
    Ok(unspent)
}

pub fn balance<R: ReadOps>(reader: &R) -> Result<u64, StoreError> {
    Ok(unspent_coins(reader)?.iter().map(StoredCoin::amount).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookpay_messages::{Bounty, Transfer};
    use hookpay_store::{Store, TransferStatus};
    use hookpay_types::{AckSignature, Hash, Magnitude, PublicKey, Signature};

    fn coin(exponent: u8, tag: u8) -> StoredCoin {
        StoredCoin {
            owner: PublicKey([tag; 32]),
            magnitude: Magnitude::new(exponent).unwrap(),
            existence_proof: Signature([tag; 64]),
            claim_hash: Hash::new([tag; 32]),
            blinding_nonce: PublicKey([tag; 32]),
        }
    }

    fn spend(coin: &StoredCoin, status: TransferStatus) -> TransferRecord {
        let transfer = Transfer {
            inputs: vec![coin.claimed()],
            outputs: vec![Bounty::new(1, PublicKey([9; 32]))],
            hookout: None,
            authorization: Signature([0; 64]),
        };
        TransferRecord::new(transfer, status)
    }

    fn store_with(coins: &[StoredCoin], transfers: &[TransferRecord]) -> Store {
        let store = Store::in_memory();
        store
            .transact(|txn| -> Result<(), StoreError> {
                for c in coins {
                    txn.put(c)?;
                }
                for t in transfers {
                    txn.put(t)?;
                }
                Ok(())
            })
            .unwrap();
        store
    }

    #[test]
    fn unreferenced_coins_are_unspent() {
        let store = store_with(&[coin(1, 1), coin(3, 2)], &[]);
        assert_eq!(unspent_coins(&store).unwrap().len(), 2);
        assert_eq!(balance(&store).unwrap(), 10);
    }

    #[test]
    fn pending_and_acknowledged_spends_reserve_inputs() {
        let a = coin(1, 1);
        let b = coin(3, 2);
        let c = coin(0, 3);
        let store = store_with(
            &[a.clone(), b.clone(), c.clone()],
            &[
                spend(&a, TransferStatus::Pending),
                spend(&b, TransferStatus::Acknowledged(AckSignature([1; 64]))),
            ],
        );
        assert_eq!(unspent_coins(&store).unwrap(), vec![c]);
        assert_eq!(balance(&store).unwrap(), 1);
    }

    #[test]
    fn conflicted_spends_release_inputs() {
        let a = coin(2, 1);
        let store = store_with(&[a.clone()], &[spend(&a, TransferStatus::Conflicted)]);
        assert_eq!(unspent_coins(&store).unwrap(), vec![a]);
    }

    #[test]
    fn one_live_spender_is_enough() {
        let a = coin(2, 1);
        let store = store_with(
            &[a.clone()],
            &[
                spend(&a, TransferStatus::Conflicted),
                spend(&a, TransferStatus::Pending),
            ],
        );
        assert!(unspent_coins(&store).unwrap().is_empty());
    }
}
