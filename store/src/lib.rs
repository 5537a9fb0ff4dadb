//! The wallet's single source of truth.
//!
//! Rows live in named tables keyed by content hash (or a composite key) with
//! secondary indices. Multi-table writes run inside [`Store::transact`]: the
//! closure's writes become visible all at once or not at all. After a commit
//! the store publishes one [`ChangeEvent`] per written row to the
//! [`ChangeFeed`] subscribers of each matching [`Topic`].
//!
//! Storage mechanics are behind [`StoreBackend`]; [`MemoryBackend`] lives
//! here and an LMDB backend lives in `hookpay-store-lmdb`.

pub mod backend;
pub mod error;
pub mod feed;
pub mod memory;
pub mod record;
pub mod rows;
pub mod store;
pub mod table;
pub mod txn;

pub use backend::{BatchOp, Keyspace, StoreBackend, WriteBatch};
pub use error::StoreError;
pub use feed::{ChangeEvent, ChangeFeed, Listener, SubscriptionId, Topic};
pub use memory::MemoryBackend;
pub use record::Record;
pub use rows::{
    BitcoinAddressRow, ClaimRecord, ConfigRow, DirectAddressRow, StoredCoin, TransferRecord,
    TransferStatus,
};
pub use store::Store;
pub use table::{Index, Table};
pub use txn::{ReadOps, WriteTxn};
