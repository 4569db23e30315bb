//! Poll service core.
//!
//! Participants are soft accounts: a name inside one session, created on
//! first use and optionally guarded by a password fixed at creation. Every
//! operation here runs as one store transaction, so a failed call never
//! leaves partial rows behind.

pub mod error;
pub mod input;
pub mod resolver;
pub mod service;
pub mod session;
pub mod timeslot;
pub mod vote;

pub use error::PollError;
pub use resolver::{IdentityPolicy, ParticipantResolver, Resolution};
pub use service::PollService;
pub use session::{CreatedSession, NewSession, SessionView, TimeslotView, VoteView};
pub use timeslot::NewTimeslot;
pub use vote::VoteReceipt;
