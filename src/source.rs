//! Byte source trait

use bytes::Bytes;

use crate::Result;

/// Supplier of archive bytes
///
/// Sources abstract over where the archive comes from (file, memory,
/// socket, pushed chunks). They only hand out bytes; framing is done by
/// the [`FrameDecoder`](crate::codec::FrameDecoder).
#[async_trait::async_trait]
pub trait ByteSource: Send + 'static {
    /// Wait for the next chunk of bytes
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` - More bytes (possibly empty)
    /// - `Ok(None)` - Source exhausted, no more bytes will arrive
    /// - `Err(e)` - The source failed; the session ends with this error
    ///
    /// Implementations must be cancel safe: the driver polls this inside
    /// `tokio::select!` and may drop the future before it completes.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;

    /// Human readable description for logs
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

#[async_trait::async_trait]
impl ByteSource for Box<dyn ByteSource> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        (**self).next_chunk().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
