//! Replay sessions
//!
//! A [`ReplaySession`] ties a byte source to a worker task and hands the
//! resulting draw events to the caller as a stream.

pub mod replay;

pub use replay::{ReplayEvents, ReplaySession};
