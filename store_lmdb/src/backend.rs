use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use hookpay_store::{BatchOp, Keyspace, StoreBackend, StoreError, WriteBatch};

use crate::migration::Migrator;
use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Default map size: 1 GiB of address space (not disk).
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

pub struct LmdbBackend {
    env: Env,
    rows_db: Database<Bytes, Bytes>,
    indices_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbBackend {
    /// Open (or create) the environment under `path` and migrate it to the
    /// current schema.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process per path and
        // never mapped twice, which is what heed requires.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(3)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let rows_db = env.create_database(&mut wtxn, Some("rows"))?;
        let indices_db = env.create_database(&mut wtxn, Some("indices"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let backend = Self {
            env,
            rows_db,
            indices_db,
            meta_db,
        };
        Migrator::run(&backend)?;
        info!(path = %path.display(), "opened LMDB wallet store");
        Ok(backend)
    }

    fn db(&self, space: Keyspace) -> &Database<Bytes, Bytes> {
        match space {
            Keyspace::Rows => &self.rows_db,
            Keyspace::Indices => &self.indices_db,
        }
    }

    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

impl StoreBackend for LmdbBackend {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self
            .db(space)
            .get(&rtxn, key)
            .map_err(LmdbError::from)?
            .map(<[u8]>::to_vec);
        Ok(value)
    }

    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .db(space)
            .prefix_iter(&rtxn, prefix)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(LmdbError::from)?;
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { space, key, value } => {
                    self.db(space)
                        .put(&mut wtxn, &key, &value)
                        .map_err(LmdbError::from)?;
                }
                BatchOp::Delete { space, key } => {
                    self.db(space)
                        .delete(&mut wtxn, &key)
                        .map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
