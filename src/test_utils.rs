//! Test utilities for building synthetic archives
//!
//! Archives are assembled from documents with the same encoder a recording
//! client uses, so tests and benchmarks do not depend on fixture files.

#![cfg(any(test, feature = "benchmark"))]

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::json;

use crate::codec::encode_pack;
use crate::types::PackType;

/// Builder for in-memory archives
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    bytes: BytesMut,
    frames: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a DATA pack carrying a JSON document
    pub fn document(self, doc: &serde_json::Value, compress: bool) -> Self {
        let payload = serde_json::to_vec(doc).expect("test document serializes");
        self.pack(PackType::Data, &payload, compress)
    }

    /// Append a stroke by `client` on `layer` through `points`
    pub fn stroke(self, client: &str, layer: &str, points: &[(i32, i32)]) -> Self {
        self.document(&block_document(client, layer, points), false)
    }

    /// Append an arbitrary pack
    pub fn pack(mut self, pack_type: PackType, payload: &[u8], compress: bool) -> Self {
        let frame = encode_pack(pack_type, payload, compress).expect("test pack encodes");
        self.bytes.put_slice(&frame);
        self.frames += 1;
        self
    }

    /// Append raw bytes without framing
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.put_slice(bytes);
        self
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn build(self) -> Bytes {
        self.bytes.freeze()
    }
}

/// JSON stroke document using the basic brush
pub fn block_document(client: &str, layer: &str, points: &[(i32, i32)]) -> serde_json::Value {
    let block: Vec<_> = points.iter().map(|&(x, y)| json!({ "x": x, "y": y })).collect();
    json!({
        "action": "block",
        "clientid": client,
        "layer": layer,
        "brush": { "name": "BasicBrush", "width": 3, "color": { "red": 0, "green": 0, "blue": 0 } },
        "block": block,
    })
}

/// Archive of `strokes` short diagonal strokes, alternating clients
pub fn sample_archive(strokes: usize, compress: bool) -> Bytes {
    let mut builder = ArchiveBuilder::new();
    for i in 0..strokes {
        let offset = (i % 64) as i32;
        let client = if i % 2 == 0 { "alice" } else { "bob" };
        let doc = block_document(
            client,
            "0",
            &[(offset, offset), (offset + 4, offset + 2), (offset + 8, offset + 4)],
        );
        builder = builder.document(&doc, compress);
    }
    builder.build()
}
