//! HTTP JSON API for meetpoll.
//!
//! Provides endpoints for:
//! - Health checks
//! - Session creation and retrieval
//! - Vote submission (full replacement of a voter's ballot)
//! - Timeslot proposal and deletion
//!
//! Poll errors map onto HTTP status codes in [`error`]; every core call runs
//! on the blocking pool because password hashing and LMDB both block.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer};
