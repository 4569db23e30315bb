//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the API accepts votes:
//! every timeslot must belong to an existing session and every vote must
//! reference an existing timeslot and be reachable from the voter index.

use std::path::Path;

use heed::types::Bytes;
use heed::RoTxn;

use meetpoll_types::{Timeslot, Vote};

use crate::environment::DATABASE_NAMES;
use crate::keys::{self, read_component};
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check database integrity.
///
/// Read failures and dangling references are recorded in the report rather
/// than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for &db_name in DATABASE_NAMES {
        match env.env().open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    check_timeslots(env, &rtxn, &mut report)?;
    check_votes(env, &rtxn, &mut report)?;
    Ok(report)
}

fn check_timeslots(
    env: &LmdbEnvironment,
    rtxn: &RoTxn,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    for result in env.dbs.timeslots.iter(rtxn)? {
        let (_key, val) = result?;
        let timeslot: Timeslot = match bincode::deserialize(val) {
            Ok(ts) => ts,
            Err(e) => {
                report.errors.push(format!("undecodable timeslot: {e}"));
                continue;
            }
        };
        let session_key = keys::single(timeslot.session_id.as_bytes())?;
        if env.dbs.sessions.get(rtxn, &session_key)?.is_none() {
            report.errors.push(format!(
                "timeslot {} references missing session {}",
                timeslot.id, timeslot.session_id
            ));
        }
    }
    Ok(())
}

fn check_votes(
    env: &LmdbEnvironment,
    rtxn: &RoTxn,
    report: &mut IntegrityReport,
) -> Result<(), LmdbError> {
    let mut indexed = 0u64;
    for result in env.dbs.voter_votes.iter(rtxn)? {
        let (key, _) = result?;
        indexed += 1;
        // enc(session) ++ enc(voter) ++ enc(timeslot)
        let Some((_session, next)) = read_component(key, 0) else {
            report.errors.push("truncated voter index key".into());
            continue;
        };
        let Some((voter, next)) = read_component(key, next) else {
            report.errors.push("truncated voter index key".into());
            continue;
        };
        let Some((timeslot, _)) = read_component(key, next) else {
            report.errors.push("truncated voter index key".into());
            continue;
        };
        let vote_key = keys::pair(timeslot, voter)?;
        if env.dbs.votes.get(rtxn, &vote_key)?.is_none() {
            report.errors.push(format!(
                "voter index entry {}/{} has no vote",
                String::from_utf8_lossy(timeslot),
                String::from_utf8_lossy(voter)
            ));
        }
    }

    let mut stored = 0u64;
    for result in env.dbs.votes.iter(rtxn)? {
        let (_key, val) = result?;
        stored += 1;
        let vote: Vote = match bincode::deserialize(val) {
            Ok(v) => v,
            Err(e) => {
                report.errors.push(format!("undecodable vote: {e}"));
                continue;
            }
        };
        let ts_key = keys::single(vote.timeslot_id.as_bytes())?;
        if env.dbs.timeslots.get(rtxn, &ts_key)?.is_none() {
            report.errors.push(format!(
                "vote {} references missing timeslot {}",
                vote.id, vote.timeslot_id
            ));
        }
    }

    if indexed != stored {
        report.errors.push(format!(
            "voter index has {indexed} entries but {stored} votes are stored"
        ));
    }
    Ok(())
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent or empty) directory. Returns an
/// error if the directory holds other files but `data.mdb` is missing, which
/// suggests corruption or a misconfigured path.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let is_empty = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?
        .next()
        .is_none();
    if is_empty {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
