//! Pack routing by declared type

use tracing::{trace, warn};

use crate::types::{DecodedPacket, Document, PackType};
use crate::{ReplayError, Result};

/// Routes decoded packets to the replay path.
///
/// DATA packs are parsed into [`Document`]s. Every other pack type is
/// reserved and ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackRouter {
    ignored: u64,
}

impl PackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one packet.
    ///
    /// Returns `Ok(None)` for non-DATA packs and `Err(MalformedDocument)`
    /// when a DATA payload is not a valid document.
    pub fn route(&mut self, packet: &DecodedPacket) -> Result<Option<Document>> {
        match packet.pack_type {
            PackType::Data => match Document::from_slice(&packet.payload) {
                Ok(doc) => {
                    trace!(action = %doc.action, points = doc.block.len(), "Routed data document");
                    Ok(Some(doc))
                }
                Err(e) => {
                    warn!(len = packet.payload.len(), "Dropping malformed data pack: {}", e);
                    Err(ReplayError::malformed_document(e.to_string()))
                }
            },
            other => {
                self.ignored += 1;
                trace!(pack_type = ?other, "Ignoring reserved pack type");
                Ok(None)
            }
        }
    }

    /// Number of non-DATA packs seen
    pub fn ignored(&self) -> u64 {
        self.ignored
    }
}
