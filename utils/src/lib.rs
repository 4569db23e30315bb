//! Shared utilities for meetpoll.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
