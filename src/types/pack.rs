//! Pack header and decoded packet types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Header bit carrying the compressed flag
pub const COMPRESSED_BIT: u8 = 0b001;

/// Header bits carrying the pack type
pub const PACK_TYPE_MASK: u8 = 0b110;

/// Declared type of a pack
///
/// Only [`PackType::Data`] carries drawing content. The other types are
/// accepted and ignored so that producers can extend the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PackType {
    Manager = 0,
    Command = 1,
    Data = 2,
    Message = 3,
}

impl PackType {
    /// Build a pack type from its two-bit wire value
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => PackType::Manager,
            1 => PackType::Command,
            2 => PackType::Data,
            _ => PackType::Message,
        }
    }

    /// Two-bit wire value
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// One-byte packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub compressed: bool,
    pub pack_type: PackType,
}

impl PacketHeader {
    pub fn new(compressed: bool, pack_type: PackType) -> Self {
        Self { compressed, pack_type }
    }

    /// Parse a header byte. Bits above bit 2 are ignored.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            compressed: byte & COMPRESSED_BIT != 0,
            pack_type: PackType::from_bits((byte & PACK_TYPE_MASK) >> 1),
        }
    }

    pub fn to_byte(self) -> u8 {
        (self.compressed as u8) | (self.pack_type.bits() << 1)
    }
}

/// A framed pack after header parsing and decompression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub pack_type: PackType,
    pub payload: Bytes,
}

impl DecodedPacket {
    pub fn new(pack_type: PackType, payload: impl Into<Bytes>) -> Self {
        Self { pack_type, payload: payload.into() }
    }
}
