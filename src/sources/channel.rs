//! Push-fed source for live byte streams

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::source::ByteSource;
use crate::{ReplayError, Result};

/// Source fed by a [`ChunkSender`]
///
/// Useful when bytes arrive from a transport the crate does not own. The
/// source is exhausted once every sender is dropped (or
/// [`ChunkSender::close`] is called). A sender can also fail the source
/// with [`ChunkSender::fail`].
pub struct ChannelSource {
    rx: mpsc::Receiver<std::result::Result<Bytes, std::io::Error>>,
}

/// Sending half of a [`ChannelSource`]
#[derive(Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<std::result::Result<Bytes, std::io::Error>>,
}

impl ChannelSource {
    /// Create a source with room for `capacity` pending chunks
    pub fn new(capacity: usize) -> (ChunkSender, ChannelSource) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChunkSender { tx }, ChannelSource { rx })
    }
}

impl ChunkSender {
    /// Push a chunk, waiting while the channel is full
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<()> {
        self.tx.send(Ok(chunk.into())).await.map_err(|_| ReplayError::SessionClosed)
    }

    /// Fail the source with an I/O error
    pub async fn fail(&self, error: std::io::Error) -> Result<()> {
        self.tx.send(Err(error)).await.map_err(|_| ReplayError::SessionClosed)
    }

    /// Signal that no more bytes will arrive
    pub fn close(self) {
        drop(self);
    }
}

#[async_trait::async_trait]
impl ByteSource for ChannelSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self.rx.recv().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(ReplayError::from(e)),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        "channel".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_arrive_in_order_and_close_ends_the_source() {
        let (tx, mut source) = ChannelSource::new(4);
        tx.send(&b"ab"[..]).await.unwrap();
        tx.send(&b"cd"[..]).await.unwrap();
        tx.close();

        assert_eq!(source.next_chunk().await.unwrap().unwrap().as_ref(), b"ab");
        assert_eq!(source.next_chunk().await.unwrap().unwrap().as_ref(), b"cd");
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failures_surface_as_source_errors() {
        let (tx, mut source) = ChannelSource::new(1);
        tx.fail(std::io::Error::other("connection reset")).await.unwrap();
        assert!(matches!(source.next_chunk().await, Err(ReplayError::SourceIo { .. })));
    }
}
