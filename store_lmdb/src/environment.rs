//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use meetpoll_store::{PollStore, StoreError};

use crate::migration::Migrator;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn};
use crate::LmdbError;

/// Number of named databases in the environment.
const MAX_DBS: u32 = 8;

/// Handles to every database in the environment.
#[derive(Clone, Copy)]
pub struct Databases {
    /// `enc(session_id)` → `Session`
    pub(crate) sessions: Database<Bytes, Bytes>,
    /// `enc(timeslot_id)` → `Timeslot`
    pub(crate) timeslots: Database<Bytes, Bytes>,
    /// `enc(session_id) ++ enc(timeslot_id)` → empty
    pub(crate) session_timeslots: Database<Bytes, Bytes>,
    /// `enc(session_id) ++ start ++ end` → timeslot id
    pub(crate) timeslot_spans: Database<Bytes, Bytes>,
    /// `enc(session_id) ++ enc(name)` → `Participant`
    pub(crate) participants: Database<Bytes, Bytes>,
    /// `enc(timeslot_id) ++ enc(voter)` → `Vote`
    pub(crate) votes: Database<Bytes, Bytes>,
    /// `enc(session_id) ++ enc(voter) ++ enc(timeslot_id)` → empty
    pub(crate) voter_votes: Database<Bytes, Bytes>,
    /// free-form metadata (schema version)
    pub(crate) meta: Database<Bytes, Bytes>,
}

/// Database names, in creation order.
pub const DATABASE_NAMES: &[&str] = &[
    "sessions",
    "timeslots",
    "session_timeslots",
    "timeslot_spans",
    "participants",
    "votes",
    "voter_votes",
    "meta",
];

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) dbs: Databases,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process
        // and the memory map is never modified outside of LMDB transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut create = |name: &str| env.create_database::<Bytes, Bytes>(&mut wtxn, Some(name));
        let dbs = Databases {
            sessions: create("sessions")?,
            timeslots: create("timeslots")?,
            session_timeslots: create("session_timeslots")?,
            timeslot_spans: create("timeslot_spans")?,
            participants: create("participants")?,
            votes: create("votes")?,
            voter_votes: create("voter_votes")?,
            meta: create("meta")?,
        };
        wtxn.commit()?;

        let environment = Self { env, dbs };
        Migrator::run(&environment)?;
        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(environment)
    }

    /// Access the raw heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl PollStore for LmdbEnvironment {
    type Read<'a> = LmdbReadTxn<'a>;
    type Write<'a> = LmdbWriteTxn<'a>;

    fn read(&self) -> Result<LmdbReadTxn<'_>, StoreError> {
        let txn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(LmdbReadTxn::new(txn, &self.dbs))
    }

    fn begin(&self) -> Result<LmdbWriteTxn<'_>, StoreError> {
        let txn = self.env.write_txn().map_err(LmdbError::from)?;
        Ok(LmdbWriteTxn::new(txn, &self.dbs))
    }
}
