//! Typed publish/subscribe for committed store changes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hookpay_types::{Hash, PublicKey};
use tracing::warn;

use crate::Table;

/// What a subscriber can listen to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Any row of a table.
    Table(Table),
    /// One row, by primary key.
    Row(Table, Vec<u8>),
    /// Bounties addressed to a claimant.
    Claimant(PublicKey),
    /// Hookins credited to a bitcoin address.
    BitcoinAddress(String),
    /// Transfers spending a coin.
    CoinInput(Hash),
    /// Transfers paying out through a hookout.
    Hookout(Hash),
}

/// A committed write to one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub key: Vec<u8>,
    pub topics: Vec<Topic>,
}

pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Registry = HashMap<Topic, Vec<(SubscriptionId, Listener)>>;

/// Fan-out of change events by topic.
///
/// Listeners run inline on the committing thread after the commit, with no
/// store lock held, so they may read the store or subscribe again. Keep them
/// fast.
#[derive(Default)]
pub struct ChangeFeed {
    listeners: RwLock<Registry>,
    next_id: AtomicU64,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single push or retain; a poisoned registry is
    // still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.listeners.read().unwrap_or_else(|poisoned| {
            warn!("change feed lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.listeners.write().unwrap_or_else(|poisoned| {
            warn!("change feed lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn subscribe(&self, topic: Topic, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().entry(topic).or_default().push((id, listener));
        id
    }

    /// Returns `false` if the subscription was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.write().retain(|_, subs| {
            let before = subs.len();
            subs.retain(|(sub, _)| *sub != id);
            removed |= subs.len() != before;
            !subs.is_empty()
        });
        removed
    }

    pub fn publish(&self, events: &[ChangeEvent]) {
        for event in events {
            let targets: Vec<Listener> = {
                let listeners = self.read();
                event
                    .topics
                    .iter()
                    .filter_map(|topic| listeners.get(topic))
                    .flatten()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect()
            };
            for listener in targets {
                listener(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn event(topics: Vec<Topic>) -> ChangeEvent {
        ChangeEvent {
            table: Table::Bounties,
            key: vec![1],
            topics,
        }
    }

    #[test]
    fn publish_reaches_matching_topics_only() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let misses = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        feed.subscribe(
            Topic::Table(Table::Bounties),
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let m = Arc::clone(&misses);
        feed.subscribe(
            Topic::Table(Table::Coins),
            Arc::new(move |_| {
                m.fetch_add(1, Ordering::SeqCst);
            }),
        );

        feed.publish(&[event(vec![Topic::Table(Table::Bounties)])]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(misses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = feed.subscribe(
            Topic::Claimant(PublicKey([1u8; 32])),
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(feed.unsubscribe(id));
        assert!(!feed.unsubscribe(id));
        assert_eq!(feed.subscriber_count(), 0);

        feed.publish(&[event(vec![Topic::Claimant(PublicKey([1u8; 32]))])]);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_sees_event_once_per_matching_topic() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let listener: Listener = Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        feed.subscribe(Topic::Table(Table::Bounties), Arc::clone(&listener));
        feed.subscribe(Topic::Row(Table::Bounties, vec![1]), listener);

        feed.publish(&[event(vec![
            Topic::Table(Table::Bounties),
            Topic::Row(Table::Bounties, vec![1]),
        ])]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscriptions_survive_a_poisoned_lock() {
        let feed = Arc::new(ChangeFeed::new());
        let poisoner = Arc::clone(&feed);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.listeners.write().unwrap();
            panic!("listener registry poisoned");
        })
        .join();
        assert!(feed.listeners.is_poisoned());

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = feed.subscribe(
            Topic::Table(Table::Coins),
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(feed.subscriber_count(), 1);

        feed.publish(&[ChangeEvent {
            table: Table::Coins,
            key: vec![2],
            topics: vec![Topic::Table(Table::Coins)],
        }]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(feed.unsubscribe(id));
    }
}
