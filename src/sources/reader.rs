//! Source reading from any tokio `AsyncRead` (files, sockets, pipes)

use bytes::{Bytes, BytesMut};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, trace, warn};

use crate::source::ByteSource;
use crate::{ReplayError, Result};

/// Default read buffer size
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Byte source over an `AsyncRead`
pub struct ReaderSource<R> {
    reader: R,
    buffer: BytesMut,
    chunk_size: usize,
    label: String,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            reader,
            buffer: BytesMut::with_capacity(chunk_size),
            chunk_size,
            label: "reader".to_string(),
        }
    }
}

impl ReaderSource<tokio::fs::File> {
    /// Open an archive file
    pub async fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ReplayError::file_error(path.to_path_buf(), e))?;

        if let Ok(metadata) = file.metadata().await {
            info!("Opened archive {}: {} bytes", path.display(), metadata.len());
        }

        let mut source = Self::with_chunk_size(file, chunk_size);
        source.label = path.display().to_string();
        Ok(source)
    }
}

#[async_trait::async_trait]
impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.buffer.reserve(self.chunk_size);
        // read_buf is cancel safe: nothing is consumed unless it completes
        let read = self.reader.read_buf(&mut self.buffer).await.map_err(|e| {
            warn!(source = %self.label, "Read failed: {}", e);
            ReplayError::from(e)
        })?;

        if read == 0 {
            trace!(source = %self.label, "Reader reached end of input");
            return Ok(None);
        }
        Ok(Some(self.buffer.split().freeze()))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_in_chunks_until_eof() {
        let data: &[u8] = b"0123456789";
        let mut source = ReaderSource::with_chunk_size(data, 4);

        let mut collected = Vec::new();
        while let Some(chunk) = source.next_chunk().await.unwrap() {
            assert!(chunk.len() <= 10);
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, data);
        assert!(source.next_chunk().await.unwrap().is_none());
    }

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("device unplugged")))
        }
    }

    #[tokio::test]
    async fn read_failure_is_a_source_error() {
        let mut source = ReaderSource::new(BrokenReader);
        assert!(matches!(source.next_chunk().await, Err(ReplayError::SourceIo { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn read_failure_on_an_opened_path_is_a_source_error() {
        // opening a directory succeeds on unix, reading it does not
        let dir = tempfile::tempdir().unwrap();
        let mut source = ReaderSource::open(dir.path(), DEFAULT_CHUNK_SIZE).await.unwrap();
        assert!(matches!(source.next_chunk().await, Err(ReplayError::SourceIo { .. })));
    }

    #[tokio::test]
    async fn missing_file_is_a_file_error() {
        let result = ReaderSource::open("/definitely/not/here.paintty", DEFAULT_CHUNK_SIZE).await;
        assert!(matches!(result, Err(ReplayError::File { .. })));
    }
}
