use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::backend::{Keyspace, StoreBackend};
use crate::feed::{ChangeFeed, Listener, SubscriptionId, Topic};
use crate::memory::MemoryBackend;
use crate::txn::{ReadOps, WriteTxn};
use crate::StoreError;

/// Typed tables over a [`StoreBackend`] with a change feed.
pub struct Store {
    backend: Arc<dyn StoreBackend>,
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl Store {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            feed: ChangeFeed::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Run `f` inside a write transaction.
    ///
    /// Writers are serialized. If `f` returns `Ok`, its writes are applied
    /// atomically and change events are published after the commit; if it
    /// returns `Err`, nothing is written.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let (value, events) = {
            let _guard = self
                .write_lock
                .lock()
                .map_err(|_| StoreError::Backend("store write lock poisoned".into()))?;
            let mut txn = WriteTxn::new(self.backend.as_ref());
            let value = f(&mut txn)?;
            let (batch, events) = txn.into_parts();
            if !batch.is_empty() {
                debug!(ops = batch.len(), rows = events.len(), "committing store transaction");
                self.backend.apply(batch)?;
            }
            (value, events)
        };
        self.feed.publish(&events);
        Ok(value)
    }

    pub fn subscribe(&self, topic: Topic, listener: Listener) -> SubscriptionId {
        self.feed.subscribe(topic, listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }
}

impl ReadOps for Store {
    fn get_raw(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.backend.get(space, key)
    }

    fn scan_raw(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.backend.scan_prefix(space, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{BitcoinAddressRow, DirectAddressRow, TransferRecord, TransferStatus};
    use crate::table::{str_value, Index, Table};
    use hookpay_messages::{Bounty, ClaimedCoin, Hashable, Transfer};
    use hookpay_types::{Magnitude, PublicKey, Signature};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bounty(amount: u64, claimant: u8) -> Bounty {
        Bounty::new(amount, PublicKey([claimant; 32]))
    }

    fn transfer_record(status: TransferStatus) -> TransferRecord {
        let transfer = Transfer {
            inputs: vec![ClaimedCoin {
                owner: PublicKey([1u8; 32]),
                magnitude: Magnitude::new(3).unwrap(),
                existence_proof: Signature([0u8; 64]),
            }],
            outputs: vec![bounty(8, 2)],
            hookout: None,
            authorization: Signature([0u8; 64]),
        };
        TransferRecord::new(transfer, status)
    }

    #[test]
    fn committed_rows_are_readable() {
        let store = Store::in_memory();
        let b = bounty(5, 1);
        store
            .transact(|tx| tx.put(&b))
            .unwrap();
        let loaded: Bounty = store.get(&b.hash().0).unwrap().unwrap();
        assert_eq!(loaded, b);
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let store = Store::in_memory();
        let b = bounty(5, 1);
        let result: Result<(), StoreError> = store.transact(|tx| {
            tx.put(&b)?;
            Err(StoreError::Backend("abort".into()))
        });
        assert!(result.is_err());
        assert!(store.list::<Bounty>().unwrap().is_empty());
    }

    #[test]
    fn transaction_reads_its_own_writes() {
        let store = Store::in_memory();
        let b = bounty(5, 7);
        store
            .transact(|tx| {
                tx.put(&b)?;
                let found: Vec<Bounty> = tx.find(Index::BountyByClaimant, &[7u8; 32])?;
                assert_eq!(found, vec![b.clone()]);
                assert!(!tx.insert_if_absent(&b)?);
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn index_follows_updates() {
        let store = Store::in_memory();
        let mut record = transfer_record(TransferStatus::Pending);
        store.transact(|tx| tx.put(&record)).unwrap();
        record.status = TransferStatus::Conflicted;
        store.transact(|tx| tx.put(&record)).unwrap();

        let pending: Vec<TransferRecord> = store.find(Index::TransferByStatus, &[0]).unwrap();
        let conflicted: Vec<TransferRecord> = store.find(Index::TransferByStatus, &[2]).unwrap();
        assert!(pending.is_empty());
        assert_eq!(conflicted.len(), 1);
        assert_eq!(store.list::<TransferRecord>().unwrap().len(), 1);
    }

    #[test]
    fn ordered_scan_by_derivation_index() {
        let store = Store::in_memory();
        store
            .transact(|tx| {
                for (i, idx) in [5u32, 1, 300].iter().enumerate() {
                    tx.put(&DirectAddressRow {
                        claimant: PublicKey([i as u8; 32]),
                        index: *idx,
                        internal: false,
                    })?;
                }
                tx.put(&DirectAddressRow {
                    claimant: PublicKey([9u8; 32]),
                    index: 1000,
                    internal: true,
                })
            })
            .unwrap();

        let external: Vec<DirectAddressRow> =
            store.find(Index::DirectAddressByLineage, &[0]).unwrap();
        let indices: Vec<u32> = external.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 5, 300]);

        let last: Option<DirectAddressRow> =
            store.find_last(Index::DirectAddressByLineage, &[1]).unwrap();
        assert_eq!(last.map(|r| r.index), Some(1000));
    }

    #[test]
    fn lookup_by_string_index() {
        let store = Store::in_memory();
        let row = BitcoinAddressRow {
            address: "tb1qabc".into(),
            index: 0,
            claimant: PublicKey([1u8; 32]),
        };
        store.transact(|tx| tx.put(&row)).unwrap();
        let found: Vec<BitcoinAddressRow> = store
            .find(Index::BitcoinAddressByAddress, &str_value("tb1qabc"))
            .unwrap();
        assert_eq!(found, vec![row]);
        let missing: Vec<BitcoinAddressRow> = store
            .find(Index::BitcoinAddressByAddress, &str_value("tb1qab"))
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn commit_notifies_table_row_and_secondary_topics() {
        let store = Store::in_memory();
        let table_hits = Arc::new(AtomicUsize::new(0));
        let claimant_hits = Arc::new(AtomicUsize::new(0));
        let coin_hits = Arc::new(AtomicUsize::new(0));

        let t = Arc::clone(&table_hits);
        store.subscribe(
            Topic::Table(Table::Bounties),
            Arc::new(move |_| {
                t.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let c = Arc::clone(&claimant_hits);
        store.subscribe(
            Topic::Claimant(PublicKey([3u8; 32])),
            Arc::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let record = transfer_record(TransferStatus::Pending);
        let coin_hash = record.transfer.inputs[0].hash();
        let k = Arc::clone(&coin_hits);
        store.subscribe(
            Topic::CoinInput(coin_hash),
            Arc::new(move |event| {
                assert_eq!(event.table, Table::Transfers);
                k.fetch_add(1, Ordering::SeqCst);
            }),
        );

        store
            .transact(|tx| {
                tx.put(&bounty(1, 3))?;
                tx.put(&bounty(2, 4))?;
                tx.put(&record)
            })
            .unwrap();

        assert_eq!(table_hits.load(Ordering::SeqCst), 2);
        assert_eq!(claimant_hits.load(Ordering::SeqCst), 1);
        assert_eq!(coin_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn aborted_transaction_notifies_nobody() {
        let store = Store::in_memory();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        store.subscribe(
            Topic::Table(Table::Bounties),
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let _: Result<(), StoreError> = store.transact(|tx| {
            tx.put(&bounty(1, 1))?;
            Err(StoreError::Backend("abort".into()))
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
