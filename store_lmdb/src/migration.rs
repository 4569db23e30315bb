//! Database schema versioning.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration steps to bring an older database up to date.

use crate::{LmdbEnvironment, LmdbError};

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - If the stored version is *higher* than what this code supports, the
    ///   database was written by a newer release and we refuse to open it.
    pub fn run(env: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = schema_version(env)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "database schema version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        set_schema_version(env, CURRENT_SCHEMA_VERSION)?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

/// Read the stored schema version; 0 when none is stored.
pub fn schema_version(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
    let rtxn = env.env().read_txn()?;
    match env.dbs.meta.get(&rtxn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Schema("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

pub(crate) fn set_schema_version(env: &LmdbEnvironment, version: u32) -> Result<(), LmdbError> {
    let mut wtxn = env.env().write_txn()?;
    env.dbs
        .meta
        .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
    wtxn.commit()?;
    Ok(())
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: nothing to migrate from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Schema(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}
