//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration functions to bring an older store up to date.

use crate::{LmdbBackend, LmdbError};

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - A version matching `CURRENT_SCHEMA_VERSION` is a no-op.
    /// - A *higher* version was written by a newer wallet; refuse to open it.
    pub fn run(backend: &LmdbBackend) -> Result<(), LmdbError> {
        let current = backend.schema_version()?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "wallet schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        backend.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: rows, indices and meta databases.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Heed(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}
