//! Pack encoding for the producer side of the wire format

use bytes::{BufMut, Bytes, BytesMut};

use super::compression;
use crate::Result;
use crate::types::{PackType, PacketHeader};

/// Size of the big-endian frame length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Build a frame body: header byte followed by the (optionally compressed) payload
pub fn assemble_pack(compress: bool, pack_type: PackType, payload: &[u8]) -> Result<Bytes> {
    let header = PacketHeader::new(compress, pack_type).to_byte();

    let body = if compress {
        compression::compress(payload)?
    } else {
        Bytes::copy_from_slice(payload)
    };

    let mut out = BytesMut::with_capacity(1 + body.len());
    out.put_u8(header);
    out.put_slice(&body);
    Ok(out.freeze())
}

/// Prefix a frame body with its big-endian length
pub fn frame_raw(body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body.len());
    out.put_u32(body.len() as u32);
    out.put_slice(body);
    out.freeze()
}

/// Encode a complete wire frame
pub fn encode_pack(pack_type: PackType, payload: &[u8], compress: bool) -> Result<Bytes> {
    let body = assemble_pack(compress, pack_type, payload)?;
    Ok(frame_raw(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_data_frame_layout() {
        let frame = encode_pack(PackType::Data, b"{}", false).unwrap();
        assert_eq!(frame.as_ref(), &[0, 0, 0, 3, 0x04, b'{', b'}']);
    }

    #[test]
    fn compressed_frame_sets_low_bit() {
        let frame = encode_pack(PackType::Command, b"payload payload", true).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - LENGTH_PREFIX_LEN);
        assert_eq!(frame[4], 0x03);
    }

    #[test]
    fn empty_body_frames_to_zero_length() {
        assert_eq!(frame_raw(&[]).as_ref(), &[0, 0, 0, 0]);
    }
}
