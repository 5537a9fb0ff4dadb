//! In-memory backend for tests and ephemeral wallets.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::backend::{BatchOp, Keyspace, StoreBackend, WriteBatch};
use crate::StoreError;

#[derive(Default)]
struct Spaces {
    rows: BTreeMap<Vec<u8>, Vec<u8>>,
    indices: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Spaces {
    fn space(&self, space: Keyspace) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        match space {
            Keyspace::Rows => &self.rows,
            Keyspace::Indices => &self.indices,
        }
    }

    fn space_mut(&mut self, space: Keyspace) -> &mut BTreeMap<Vec<u8>, Vec<u8>> {
        match space {
            Keyspace::Rows => &mut self.rows,
            Keyspace::Indices => &mut self.indices,
        }
    }
}

/// `BTreeMap`s under a single `RwLock`; a batch is applied under one write
/// guard, so readers never see half of it.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<Spaces>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory backend lock poisoned".into())
}

impl StoreBackend for MemoryBackend {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.space(space).get(key).cloned())
    }

    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .space(space)
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { space, key, value } => {
                    inner.space_mut(space).insert(key, value);
                }
                BatchOp::Delete { space, key } => {
                    inner.space_mut(space).remove(&key);
                }
            }
        }
        Ok(())
    }
}
