//! Incremental frame decoder
//!
//! The decoder owns a buffer of bytes received from the source and turns it
//! into [`DecodedPacket`]s. It never blocks: every call to
//! [`FrameDecoder::decode_next`] either yields a packet, reports a dropped
//! packet, asks for more bytes ([`Decoded::Drain`]) or reports the end of the
//! stream once the source has been marked exhausted.
//!
//! ## Usage Example
//!
//! ```rust
//! use paintty::codec::{Decoded, FrameDecoder, encode_pack};
//! use paintty::types::PackType;
//!
//! let frame = encode_pack(PackType::Data, b"{}", false).unwrap();
//! let mut decoder = FrameDecoder::default();
//!
//! decoder.push(&frame[..3]);
//! assert!(matches!(decoder.decode_next(), Decoded::Drain));
//!
//! decoder.push(&frame[3..]);
//! decoder.finish();
//! assert!(matches!(decoder.decode_next(), Decoded::Packet(p) if p.payload.as_ref() == b"{}"));
//! assert!(matches!(decoder.decode_next(), Decoded::EndOfStream));
//! ```

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use super::compression;
use super::encoder::LENGTH_PREFIX_LEN;
use crate::types::{DecodedPacket, PacketHeader};
use crate::{ReplayError, Result};

/// Default upper bound on a frame body
pub const DEFAULT_MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Outcome of one decode step
#[derive(Debug)]
pub enum Decoded {
    /// A complete packet
    Packet(DecodedPacket),

    /// A frame was consumed but its packet was dropped. Decoding can continue.
    Dropped(ReplayError),

    /// Not enough bytes buffered; push more and call again
    Drain,

    /// The source is exhausted and every complete frame has been decoded
    EndOfStream,
}

/// Counters kept by the decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub bytes_received: u64,
    pub packets_decoded: u64,
    pub packets_dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Length,
    Body(usize),
    Skip(usize),
    Done,
}

/// Frame decoder state machine
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    state: FrameState,
    exhausted: bool,
    max_frame_len: u32,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    /// Create a decoder that skips frames longer than `max_frame_len`
    pub fn new(max_frame_len: u32) -> Self {
        Self {
            buffer: BytesMut::new(),
            state: FrameState::Length,
            exhausted: false,
            max_frame_len,
            stats: DecoderStats::default(),
        }
    }

    /// Append bytes read from the source
    pub fn push(&mut self, chunk: &[u8]) {
        self.stats.bytes_received += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the source as exhausted; no more bytes will be pushed
    pub fn finish(&mut self) {
        if !self.exhausted {
            debug!(buffered = self.buffer.len(), "Byte source exhausted");
        }
        self.exhausted = true;
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether end-of-stream has been reached
    pub fn is_done(&self) -> bool {
        self.state == FrameState::Done
    }

    /// Bytes buffered but not yet decoded
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Run one decode step
    pub fn decode_next(&mut self) -> Decoded {
        loop {
            match self.state {
                FrameState::Done => return Decoded::EndOfStream,
                FrameState::Length => {
                    if self.buffer.len() < LENGTH_PREFIX_LEN {
                        return self.short_read(LENGTH_PREFIX_LEN);
                    }
                    let length = self.buffer.get_u32();
                    if length > self.max_frame_len {
                        warn!(length, limit = self.max_frame_len, "Skipping oversized frame");
                        self.stats.packets_dropped += 1;
                        self.state = FrameState::Skip(length as usize);
                        return Decoded::Dropped(ReplayError::FrameTooLarge {
                            length,
                            limit: self.max_frame_len,
                        });
                    }
                    self.state = FrameState::Body(length as usize);
                }
                FrameState::Body(length) => {
                    if self.buffer.len() < length {
                        return self.short_read(length);
                    }
                    let body = self.buffer.split_to(length).freeze();
                    self.state = FrameState::Length;
                    return self.decode_body(body);
                }
                FrameState::Skip(remaining) => {
                    let discard = remaining.min(self.buffer.len());
                    self.buffer.advance(discard);
                    let remaining = remaining - discard;
                    if remaining == 0 {
                        self.state = FrameState::Length;
                        continue;
                    }
                    self.state = FrameState::Skip(remaining);
                    return self.short_read(remaining);
                }
            }
        }
    }

    /// Iterate over the packets decodable from the bytes buffered so far.
    ///
    /// The iterator stops at the first drain or end-of-stream signal; use
    /// [`FrameDecoder::is_done`] to tell them apart.
    pub fn packets(&mut self) -> Packets<'_> {
        Packets { decoder: self }
    }

    fn short_read(&mut self, needed: usize) -> Decoded {
        if !self.exhausted {
            return Decoded::Drain;
        }

        // an oversized frame was already reported when it was skipped
        let skipping = matches!(self.state, FrameState::Skip(_));
        let clean_end = self.state == FrameState::Length && self.buffer.is_empty();
        let available = self.buffer.len();
        self.state = FrameState::Done;
        self.buffer.clear();

        if skipping {
            debug!(remaining = needed, "End of stream inside a skipped frame");
            Decoded::EndOfStream
        } else if clean_end {
            debug!(packets = self.stats.packets_decoded, "End of stream");
            Decoded::EndOfStream
        } else {
            warn!(expected = needed, available, "Archive ended inside a frame");
            self.stats.packets_dropped += 1;
            Decoded::Dropped(ReplayError::TruncatedFrame { expected: needed, available })
        }
    }

    fn decode_body(&mut self, body: Bytes) -> Decoded {
        // A zero-length body has no header byte and reads as header 0
        let header = PacketHeader::from_byte(body.first().copied().unwrap_or(0));
        let raw = if body.is_empty() { body } else { body.slice(1..) };

        let payload = if header.compressed {
            match compression::decompress(&raw) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(pack_type = ?header.pack_type, len = raw.len(), "Dropping pack: {}", e);
                    self.stats.packets_dropped += 1;
                    return Decoded::Dropped(e);
                }
            }
        } else {
            raw
        };

        self.stats.packets_decoded += 1;
        trace!(
            pack_type = ?header.pack_type,
            compressed = header.compressed,
            len = payload.len(),
            "Decoded pack"
        );
        Decoded::Packet(DecodedPacket::new(header.pack_type, payload))
    }
}

/// Iterator over currently decodable packets, see [`FrameDecoder::packets`]
pub struct Packets<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Packets<'_> {
    type Item = Result<DecodedPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.decoder.decode_next() {
            Decoded::Packet(packet) => Some(Ok(packet)),
            Decoded::Dropped(e) => Some(Err(e)),
            Decoded::Drain | Decoded::EndOfStream => None,
        }
    }
}
