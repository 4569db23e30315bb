//! Errors raised while parsing or validating plain data types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown session type: {0}")]
    UnknownSessionKind(String),

    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTimeOfDay(String),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("time window is empty: {min} is not before {max}")]
    EmptyTimeWindow { min: String, max: String },

    #[error("weekday {0} is out of range 0-6")]
    InvalidWeekday(u8),
}
