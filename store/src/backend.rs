//! Raw key/value backend abstraction.

use crate::StoreError;

/// The two key spaces every backend provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyspace {
    /// `table id ++ primary key -> encoded row`
    Rows,
    /// `index id ++ index value ++ primary key -> primary key`
    Indices,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put {
        space: Keyspace,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        space: Keyspace,
        key: Vec<u8>,
    },
}

/// A group of writes applied atomically by [`StoreBackend::apply`].
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, space: Keyspace, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { space, key, value });
    }

    pub fn delete(&mut self, space: Keyspace, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { space, key });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Ordered, transactional key/value storage.
///
/// `apply` must be atomic: after it returns, either every op is durable and
/// visible or none is.
pub trait StoreBackend: Send + Sync {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every entry whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
