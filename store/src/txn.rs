//! Typed reads shared by the store and its write transactions, and the
//! transaction type itself.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::backend::{Keyspace, StoreBackend, WriteBatch};
use crate::feed::{ChangeEvent, Topic};
use crate::record::Record;
use crate::table::{index_key, index_prefix, row_key, Index};
use crate::StoreError;

/// Typed read operations over raw key/value access.
pub trait ReadOps {
    fn get_raw(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn scan_raw(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn get<R: Record>(&self, primary_key: &[u8]) -> Result<Option<R>, StoreError> {
        self.get_raw(Keyspace::Rows, &row_key(R::TABLE, primary_key))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn contains<R: Record>(&self, primary_key: &[u8]) -> Result<bool, StoreError> {
        Ok(self
            .get_raw(Keyspace::Rows, &row_key(R::TABLE, primary_key))?
            .is_some())
    }

    /// Every row of `R`'s table in primary key order.
    fn list<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.scan_raw(Keyspace::Rows, &row_key(R::TABLE, &[]))?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }

    /// Rows whose index value starts with `value_prefix`, in index order.
    fn find<R: Record>(&self, index: Index, value_prefix: &[u8]) -> Result<Vec<R>, StoreError> {
        debug_assert_eq!(index.table(), R::TABLE);
        let mut rows = Vec::new();
        for (_, primary_key) in self.scan_raw(Keyspace::Indices, &index_prefix(index, value_prefix))? {
            let row = self.get::<R>(&primary_key)?.ok_or_else(|| {
                StoreError::Corruption(format!(
                    "{} index entry points at a missing row",
                    R::TABLE
                ))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Last row (highest index value) matching `value_prefix`.
    fn find_last<R: Record>(
        &self,
        index: Index,
        value_prefix: &[u8],
    ) -> Result<Option<R>, StoreError> {
        Ok(self.find::<R>(index, value_prefix)?.pop())
    }
}

pub(crate) fn decode<R: Record>(bytes: &[u8]) -> Result<R, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn encode<R: Record>(record: &R) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(record)?)
}

/// An open write transaction.
///
/// Writes are buffered in an overlay that reads see (read-your-writes) and
/// are applied as one backend batch when [`Store::transact`](crate::Store::transact)
/// commits. Dropping the transaction discards them.
pub struct WriteTxn<'a> {
    backend: &'a dyn StoreBackend,
    rows: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    indices: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    events: Vec<ChangeEvent>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(backend: &'a dyn StoreBackend) -> Self {
        Self {
            backend,
            rows: BTreeMap::new(),
            indices: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    fn overlay(&self, space: Keyspace) -> &BTreeMap<Vec<u8>, Option<Vec<u8>>> {
        match space {
            Keyspace::Rows => &self.rows,
            Keyspace::Indices => &self.indices,
        }
    }

    /// Insert or replace a row, keeping its index entries in step.
    pub fn put<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let primary_key = record.primary_key();
        let key = row_key(R::TABLE, &primary_key);

        if let Some(old) = self.get::<R>(&primary_key)? {
            for (index, value) in old.index_entries() {
                self.indices
                    .insert(index_key(index, &value, &primary_key), None);
            }
        }
        for (index, value) in record.index_entries() {
            self.indices.insert(
                index_key(index, &value, &primary_key),
                Some(primary_key.clone()),
            );
        }
        self.rows.insert(key, Some(encode(record)?));

        let mut topics = vec![
            Topic::Table(R::TABLE),
            Topic::Row(R::TABLE, primary_key.clone()),
        ];
        topics.extend(record.topics());
        self.events.push(ChangeEvent {
            table: R::TABLE,
            key: primary_key,
            topics,
        });
        Ok(())
    }

    /// Insert a row unless one with the same primary key exists.
    /// Returns whether it was inserted.
    pub fn insert_if_absent<R: Record>(&mut self, record: &R) -> Result<bool, StoreError> {
        if self.contains::<R>(&record.primary_key())? {
            return Ok(false);
        }
        self.put(record)?;
        Ok(true)
    }

    pub(crate) fn into_parts(self) -> (WriteBatch, Vec<ChangeEvent>) {
        let mut batch = WriteBatch::new();
        for (space, overlay) in [(Keyspace::Rows, self.rows), (Keyspace::Indices, self.indices)] {
            for (key, value) in overlay {
                match value {
                    Some(value) => batch.put(space, key, value),
                    None => batch.delete(space, key),
                }
            }
        }
        (batch, self.events)
    }
}

impl ReadOps for WriteTxn<'_> {
    fn get_raw(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.overlay(space).get(key) {
            Some(value) => Ok(value.clone()),
            None => self.backend.get(space, key),
        }
    }

    fn scan_raw(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.scan_prefix(space, prefix)?.into_iter().collect();
        let pending = self
            .overlay(space)
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in pending {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
