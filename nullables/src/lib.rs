//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the poll service (clock, id generation,
//! storage) is abstracted behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ids;
pub mod store;

pub use clock::NullClock;
pub use ids::SequentialIds;
pub use store::NullStore;
