//! Core types for paint session replay.
//!
//! The types follow the data flow of a replay:
//! - [`PacketHeader`] and [`DecodedPacket`] come out of the frame codec
//! - [`Document`] is the structured content of a DATA pack
//! - [`DrawEvent`] and [`ReplayEvent`] are what the consumer receives
//! - [`ReplayMode`] selects between fullspeed and throttled draining
//!
//! ## Usage Example
//!
//! ```rust
//! use paintty::types::{Document, PackType, PacketHeader};
//!
//! let header = PacketHeader::from_byte(0x04);
//! assert_eq!(header.pack_type, PackType::Data);
//! assert!(!header.compressed);
//!
//! let doc = Document::from_slice(br#"{"action":"block","block":[{"x":1,"y":1}]}"#).unwrap();
//! assert!(doc.is_block());
//! ```

mod document;
mod event;
mod pack;
mod replay_mode;

pub use document::{BLOCK_ACTION, BlockPoint, BrushInfo, DEFAULT_PRESSURE, Document};
pub use event::{
    Diagnostic, DiagnosticKind, DrawEvent, DrawLineEvent, DrawPointEvent, Point, ReplayEvent,
};
pub use pack::{COMPRESSED_BIT, DecodedPacket, PACK_TYPE_MASK, PackType, PacketHeader};
pub use replay_mode::ReplayMode;
