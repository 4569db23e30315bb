//! Abstract storage traits for meetpoll.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits, and receives
//! its store as an explicit handle; there is no process-wide database.

pub mod error;
pub mod txn;

pub use error::{Constraint, StoreError};
pub use txn::{ReadTxn, WriteTxn};

/// Factory for units of work over one poll database.
///
/// A [`WriteTxn`] is isolated and atomic: it commits all of its writes or,
/// when dropped or rolled back, none of them. Backends serialize write
/// transactions at least as strictly as read-committed with the unique
/// constraints of [`Constraint`] enforced.
pub trait PollStore: Send + Sync {
    type Read<'a>: ReadTxn
    where
        Self: 'a;

    type Write<'a>: WriteTxn
    where
        Self: 'a;

    /// Open a read-only snapshot.
    fn read(&self) -> Result<Self::Read<'_>, StoreError>;

    /// Begin a write transaction.
    fn begin(&self) -> Result<Self::Write<'_>, StoreError>;
}
