//! Replay session handle

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::driver::{ControlCommand, Driver, SessionSummary};
use crate::scheduler::SchedulerState;
use crate::source::ByteSource;
use crate::sources::{MemorySource, ReaderSource};
use crate::stream::{ArchiveExt, UntilArchived};
use crate::types::ReplayEvent;
use crate::{ReplayError, Result};

/// Event stream handed to the consumer
pub type ReplayEvents = UntilArchived<UnboundedReceiverStream<ReplayEvent>>;

/// One playback of an archive
///
/// The session runs on its own worker task. The handle forwards control
/// operations, exposes the event stream and the scheduler state, and
/// disposes the worker when dropped.
pub struct ReplaySession {
    /// Event receiver, until taken by the consumer
    events: Option<mpsc::UnboundedReceiver<ReplayEvent>>,

    /// Scheduler state receiver
    state: watch::Receiver<SchedulerState>,

    /// Control command sender
    control: mpsc::UnboundedSender<ControlCommand>,

    /// Cancellation token for stopping the worker
    cancel: CancellationToken,

    /// Worker task
    task: Option<JoinHandle<Result<SessionSummary>>>,
}

impl ReplaySession {
    /// Open an archive file for replay
    pub async fn open<P: AsRef<Path>>(path: P, config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        info!("Opening archive: {}", path.display());

        let source = ReaderSource::open(path, config.read_chunk_size).await?;
        Self::from_source(source, config)
    }

    /// Replay an archive held in memory
    pub fn from_bytes(archive: impl Into<Bytes>, config: ReplayConfig) -> Result<Self> {
        let source = MemorySource::with_chunk_size(archive, config.read_chunk_size.max(1));
        Self::from_source(source, config)
    }

    /// Replay from any byte source. Must be called inside a tokio runtime.
    pub fn from_source<S: ByteSource>(source: S, config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let channels = Driver::spawn(source, config);

        Ok(Self {
            events: Some(channels.events),
            state: channels.state,
            control: channels.control,
            cancel: channels.cancel,
            task: Some(channels.task),
        })
    }

    /// Take the event stream. Returns `None` if it was already taken.
    pub fn take_events(&mut self) -> Option<ReplayEvents> {
        self.events.take().map(|rx| UnboundedReceiverStream::new(rx).until_archived())
    }

    /// Stop draining until [`resume`](Self::resume)
    pub fn pause(&self) -> Result<()> {
        self.send(ControlCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(ControlCommand::Resume)
    }

    /// Switch between fullspeed and throttled draining
    pub fn set_fullspeed(&self, fullspeed: bool) -> Result<()> {
        self.send(ControlCommand::SetFullspeed(fullspeed))
    }

    /// Current scheduler state
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Scheduler state changes, starting with the current state
    pub fn state_updates(&self) -> impl Stream<Item = SchedulerState> + 'static {
        WatchStream::new(self.state.clone())
    }

    /// Wait until the archive is exhausted (or the session fails)
    pub async fn wait_exhausted(&self) -> Result<()> {
        let mut updates = Box::pin(self.state_updates());
        while let Some(state) = updates.next().await {
            if state == SchedulerState::Exhausted {
                return Ok(());
            }
        }
        Err(ReplayError::SessionClosed)
    }

    /// Wait for the worker to end and return its summary.
    ///
    /// A byte source failure is returned here as the session error.
    pub async fn finish(mut self) -> Result<SessionSummary> {
        let Some(task) = self.task.take() else {
            return Err(ReplayError::SessionClosed);
        };
        match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Replay worker did not complete: {}", e);
                Err(ReplayError::SessionClosed)
            }
        }
    }

    /// Stop the worker now. Equivalent to dropping the session.
    pub fn dispose(self) {}

    fn send(&self, command: ControlCommand) -> Result<()> {
        self.control.send(command).map_err(|_| ReplayError::SessionClosed)
    }
}

impl Drop for ReplaySession {
    fn drop(&mut self) {
        debug!("Dropping replay session");
        self.cancel.cancel();
    }
}
