//! LMDB storage backend for the hookpay wallet store.
//!
//! One `heed` environment holds three databases: `rows` and `indices`
//! (the two [`Keyspace`](hookpay_store::Keyspace)s) and `meta` for the schema
//! version. Each [`WriteBatch`](hookpay_store::WriteBatch) is one LMDB write
//! transaction.

pub mod backend;
pub mod error;
pub mod migration;

pub use backend::LmdbBackend;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
