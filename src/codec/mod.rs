//! Frame codec for the paint session wire format.
//!
//! ```text
//! [4 bytes: u32 body_length][1 byte: header][body_length-1 bytes: payload]
//! header bit0     = compressed flag
//! header bits1..2 = pack type (0=MANAGER, 1=COMMAND, 2=DATA, 3=MESSAGE)
//! ```
//!
//! All integers are big-endian. Compressed payloads carry a 4-byte
//! uncompressed length followed by a zlib stream.

pub mod compression;
mod decoder;
mod encoder;

pub use decoder::{DEFAULT_MAX_FRAME_LEN, Decoded, DecoderStats, FrameDecoder, Packets};
pub use encoder::{LENGTH_PREFIX_LEN, assemble_pack, encode_pack, frame_raw};
