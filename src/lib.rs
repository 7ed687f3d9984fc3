//! Replay engine for recorded collaborative paint sessions.
//!
//! A paint session archive is a stream of length-prefixed, optionally
//! zlib-compressed packs. Paintty decodes the stream incrementally, picks
//! out the stroke documents and replays them as ordered draw events, either
//! as fast as possible or throttled to one document per tick.
//!
//! # Features
//!
//! - **Incremental decoding**: frames may be split across reads at any byte
//! - **Resilient**: corrupt packs and documents are reported and skipped
//! - **Pace control**: pause, resume and fullspeed switching mid-replay
//! - **Canvas**: an optional raster consumer that renders events to PNG
//!
//! ## Example
//!
//! ```rust,no_run
//! use paintty::{Paintty, ReplayConfig};
//! use paintty::types::ReplayEvent;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Paintty::open("/path/to/session.paintty", ReplayConfig::default()).await?;
//!     let mut events = session.take_events().expect("fresh session");
//!
//!     while let Some(event) = events.next().await {
//!         if let ReplayEvent::Draw(draw) = event {
//!             println!("{} on layer {}", draw.client_id(), draw.layer());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding pipeline
pub mod codec;
pub mod router;
pub mod scheduler;
pub mod translate;

// Session architecture
pub mod config;
pub mod driver;
pub mod session;
pub mod source;
pub mod sources;
pub mod stream;

// Consumers
pub mod canvas;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::ReplayConfig;
pub use driver::SessionSummary;
pub use scheduler::{ReplayScheduler, SchedulerState};
pub use session::{ReplayEvents, ReplaySession};

/// Entry point for replay sessions.
///
/// # Examples
///
/// ```rust,no_run
/// use paintty::{Paintty, ReplayConfig};
///
/// #[tokio::main]
/// async fn main() -> paintty::Result<()> {
///     let session = Paintty::open("session.paintty", ReplayConfig::default().fullspeed(true)).await?;
///     let summary = session.finish().await?;
///     println!("{} blocks replayed", summary.blocks_parsed);
///     Ok(())
/// }
/// ```
pub struct Paintty;

impl Paintty {
    /// Open an archive file for replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be opened. Decoding problems inside the archive are not errors; they
    /// show up as diagnostics on the event stream.
    pub async fn open<P: AsRef<std::path::Path>>(path: P, config: ReplayConfig) -> Result<ReplaySession> {
        ReplaySession::open(path, config).await
    }

    /// Replay an archive already in memory. Must be called inside a tokio runtime.
    pub fn from_bytes(archive: impl Into<bytes::Bytes>, config: ReplayConfig) -> Result<ReplaySession> {
        ReplaySession::from_bytes(archive, config)
    }
}
