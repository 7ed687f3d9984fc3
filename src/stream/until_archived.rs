//! Terminate an event stream at the end of the archive

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::types::ReplayEvent;

/// Extension trait ending a replay event stream after `ArchiveParsed`
pub trait ArchiveExt: Stream<Item = ReplayEvent> {
    /// Yield events up to and including `ArchiveParsed`, then end
    ///
    /// Consumers can loop with `while let Some(event) = stream.next().await`
    /// without waiting for the worker task to shut down.
    fn until_archived(self) -> UntilArchived<Self>
    where
        Self: Sized,
    {
        UntilArchived::new(self)
    }
}

impl<T: Stream<Item = ReplayEvent>> ArchiveExt for T {}

pin_project! {
    /// Stream returned by [`ArchiveExt::until_archived`]
    pub struct UntilArchived<S> {
        #[pin]
        stream: S,
        finished: bool,
    }
}

impl<S> UntilArchived<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, finished: false }
    }

    /// Whether `ArchiveParsed` has been yielded
    pub fn is_archived(&self) -> bool {
        self.finished
    }
}

impl<S: Stream<Item = ReplayEvent>> Stream for UntilArchived<S> {
    type Item = ReplayEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        let item = ready!(this.stream.poll_next(cx));
        if matches!(item, Some(ReplayEvent::ArchiveParsed) | None) {
            *this.finished = true;
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished { (0, Some(0)) } else { (0, self.stream.size_hint().1) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn ends_after_archive_parsed() {
        let events = futures::stream::iter(vec![
            ReplayEvent::BlockParsed { sequence: 0 },
            ReplayEvent::ArchiveParsed,
            ReplayEvent::BlockParsed { sequence: 1 },
        ]);

        let mut stream = events.until_archived();
        let collected: Vec<_> = (&mut stream).collect().await;
        assert_eq!(
            collected,
            vec![ReplayEvent::BlockParsed { sequence: 0 }, ReplayEvent::ArchiveParsed]
        );
        assert!(stream.is_archived());
    }

    #[tokio::test]
    async fn passes_through_a_stream_that_ends_early() {
        let events = futures::stream::iter(vec![ReplayEvent::BlockParsed { sequence: 0 }]);
        let collected: Vec<_> = events.until_archived().collect().await;
        assert_eq!(collected.len(), 1);
    }
}
