//! Pack payload compression
//!
//! Payloads use the layout produced by Qt's `qCompress`: a 4-byte big-endian
//! uncompressed length followed by a zlib stream. Like `qUncompress`, the
//! length is only a size hint: any valid stream is accepted up to
//! [`MAX_INFLATED_LEN`]. An empty inflate result is treated as a failure.

use bytes::{BufMut, Bytes, BytesMut};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};
use tracing::debug;

use crate::{ReplayError, Result};

/// Size of the uncompressed-length prefix
pub const SIZE_PREFIX_LEN: usize = 4;

/// Largest payload a single pack may inflate to
pub const MAX_INFLATED_LEN: usize = 64 * 1024 * 1024;

/// Compress a payload
pub fn compress(data: &[u8]) -> Result<Bytes> {
    let mut out = BytesMut::with_capacity(SIZE_PREFIX_LEN + data.len() / 2);
    out.put_u32(data.len() as u32);

    let mut encoder = ZlibEncoder::new(out.writer(), Compression::default());
    encoder.write_all(data)?;
    let out = encoder.finish()?.into_inner();

    Ok(out.freeze())
}

/// Decompress a payload
pub fn decompress(data: &[u8]) -> Result<Bytes> {
    if data.len() < SIZE_PREFIX_LEN {
        return Err(ReplayError::decompression(format!(
            "payload of {} bytes is shorter than the size prefix",
            data.len()
        )));
    }

    let (prefix, stream) = data.split_at(SIZE_PREFIX_LEN);
    let expected = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

    let mut out = Vec::with_capacity(expected.min(16 * 1024 * 1024));
    ZlibDecoder::new(stream)
        .take(MAX_INFLATED_LEN as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| ReplayError::decompression(format!("inflate failed: {e}")))?;

    if out.is_empty() {
        return Err(ReplayError::decompression("inflate produced no data"));
    }
    if out.len() > MAX_INFLATED_LEN {
        return Err(ReplayError::decompression(format!(
            "payload inflates past {MAX_INFLATED_LEN} bytes"
        )));
    }
    if out.len() != expected {
        debug!(expected, inflated = out.len(), "Size prefix differs from inflated length");
    }

    Ok(out.into())
}
