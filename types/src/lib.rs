//! Fundamental types for meetpoll.
//!
//! This crate defines the records shared across every other crate in the
//! workspace (sessions, timeslots, participants, votes), their identifiers,
//! and the two ambient capabilities the core consumes: a [`Clock`] and an
//! [`IdSource`].

pub mod error;
pub mod id;
pub mod participant;
pub mod session;
pub mod time;
pub mod timeslot;
pub mod vote;

pub use error::TypeError;
pub use id::{IdSource, SessionId, TimeslotId, VoteId};
pub use participant::{Participant, PasswordDigest};
pub use session::{DynamicConfig, Session, SessionKind};
pub use time::{Clock, SystemClock, Timestamp};
pub use timeslot::Timeslot;
pub use vote::{Vote, VoteItem};
