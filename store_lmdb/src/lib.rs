//! LMDB storage backend for meetpoll.
//!
//! Implements the `meetpoll-store` traits using the `heed` LMDB bindings.
//! Each record kind and each secondary index maps to one LMDB database
//! within a single environment. LMDB admits one write transaction at a time,
//! so concurrent units of work on the same environment serialize.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod migration;
pub mod txn;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use txn::{LmdbReadTxn, LmdbWriteTxn};
