//! In-memory archive source

use bytes::Bytes;

use crate::Result;
use crate::source::ByteSource;

/// Source serving an archive already held in memory
///
/// The archive is handed out in chunks of at most `chunk_size` bytes so that
/// replay behaves the same as reading from a file.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), chunk_size: usize::MAX }
    }

    pub fn with_chunk_size(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self { data: data.into(), chunk_size: chunk_size.max(1) }
    }

    /// Bytes not yet handed out
    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

#[async_trait::async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let take = self.chunk_size.min(self.data.len());
        Ok(Some(self.data.split_to(take)))
    }

    fn describe(&self) -> String {
        format!("memory ({} bytes left)", self.remaining())
    }
}
