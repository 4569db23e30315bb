//! Scheduling sessions (polls).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{SessionId, TypeError, Timestamp};

/// How a session's candidate slots are defined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// A fixed list of slots chosen by the creator.
    #[default]
    Fixed,
    /// Participants propose slots inside a time window on one date.
    Dynamic,
    /// Participants propose slots inside a time window on allowed weekdays.
    Weekly,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Dynamic => "dynamic",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "fixed" => Ok(Self::Fixed),
            "dynamic" => Ok(Self::Dynamic),
            "weekly" => Ok(Self::Weekly),
            other => Err(TypeError::UnknownSessionKind(other.to_string())),
        }
    }
}

/// Window inside which participants of a dynamic or weekly session may
/// propose slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicConfig {
    /// `YYYY-MM-DD`; used by dynamic sessions.
    #[serde(default, rename = "date_utc")]
    pub date: Option<String>,
    /// `HH:MM`
    pub min_time: String,
    /// `HH:MM`
    pub max_time: String,
    /// 0 = Sunday .. 6 = Saturday; used by weekly sessions.
    #[serde(default)]
    pub allowed_days: Vec<u8>,
}

impl DynamicConfig {
    /// Parse the `[min_time, max_time)` window, rejecting an empty one.
    pub fn time_window(&self) -> Result<(NaiveTime, NaiveTime), TypeError> {
        let min = parse_time_of_day(&self.min_time)?;
        let max = parse_time_of_day(&self.max_time)?;
        if min >= max {
            return Err(TypeError::EmptyTimeWindow {
                min: self.min_time.clone(),
                max: self.max_time.clone(),
            });
        }
        Ok((min, max))
    }

    pub fn parsed_date(&self) -> Result<Option<NaiveDate>, TypeError> {
        self.date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .map_err(|_| TypeError::InvalidDate(d.to_string()))
            })
            .transpose()
    }

    /// Check every field is well-formed.
    pub fn validate(&self) -> Result<(), TypeError> {
        self.time_window()?;
        self.parsed_date()?;
        if let Some(day) = self.allowed_days.iter().find(|d| **d > 6) {
            return Err(TypeError::InvalidWeekday(*day));
        }
        Ok(())
    }
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, TypeError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| TypeError::InvalidTimeOfDay(raw.to_string()))
}

/// One shareable scheduling poll.
///
/// Immutable after creation except for the archival stamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub creator_name: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub kind: SessionKind,
    pub dynamic_config: Option<DynamicConfig>,
}
