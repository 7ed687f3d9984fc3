//! Driver spawns and manages the replay worker task

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::codec::{Decoded, FrameDecoder};
use crate::config::ReplayConfig;
use crate::router::PackRouter;
use crate::scheduler::{ReplayScheduler, SchedulerState};
use crate::source::ByteSource;
use crate::translate::Translator;
use crate::types::ReplayEvent;
use crate::Result;

type Scheduler = ReplayScheduler<mpsc::UnboundedSender<ReplayEvent>>;

/// Control operations forwarded to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    SetFullspeed(bool),
}

/// Totals reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub bytes_read: u64,
    pub packets_decoded: u64,
    pub packets_dropped: u64,
    pub documents_enqueued: u64,
    pub blocks_parsed: u64,
    pub events_emitted: u64,
}

impl SessionSummary {
    fn collect(decoder: &FrameDecoder, router_drops: u64, scheduler: &Scheduler) -> Self {
        let decoder = decoder.stats();
        let scheduler = scheduler.stats();
        Self {
            bytes_read: decoder.bytes_received,
            packets_decoded: decoder.packets_decoded,
            packets_dropped: decoder.packets_dropped + router_drops,
            documents_enqueued: scheduler.documents_enqueued,
            blocks_parsed: scheduler.blocks_parsed,
            events_emitted: scheduler.events_emitted,
        }
    }
}

/// Result of spawning the worker
pub struct DriverChannels {
    /// Draw events and lifecycle notifications
    pub events: mpsc::UnboundedReceiver<ReplayEvent>,
    /// Current scheduler state
    pub state: watch::Receiver<SchedulerState>,
    /// Control command sender
    pub control: mpsc::UnboundedSender<ControlCommand>,
    /// Cancellation token for disposal
    pub cancel: CancellationToken,
    /// Worker task, resolving to the session summary or the fatal source error
    pub task: JoinHandle<Result<SessionSummary>>,
}

/// Driver spawns the worker that owns the byte source, the decoder and
/// the scheduler.
///
/// All session state lives on that one task, so decoding and draining never
/// block whoever consumes the events.
pub struct Driver;

impl Driver {
    /// Spawn the worker for the given source. Must be called inside a tokio runtime.
    pub fn spawn<S>(source: S, config: ReplayConfig) -> DriverChannels
    where
        S: ByteSource,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let cancel = CancellationToken::new();

        let translator = Translator::new(config.echo_policy());
        let scheduler = ReplayScheduler::new(config.mode, translator, event_tx);

        let cancel_task = cancel.clone();
        let task = tokio::spawn(async move {
            Self::replay_task(source, config, scheduler, control_rx, state_tx, cancel_task).await
        });

        DriverChannels { events: event_rx, state: state_rx, control: control_tx, cancel, task }
    }

    /// Worker loop: decode what is buffered, then wait for the next thing to do
    async fn replay_task<S>(
        mut source: S,
        config: ReplayConfig,
        mut scheduler: Scheduler,
        mut control_rx: mpsc::UnboundedReceiver<ControlCommand>,
        state_tx: watch::Sender<SchedulerState>,
        cancel: CancellationToken,
    ) -> Result<SessionSummary>
    where
        S: ByteSource,
    {
        info!(
            source = %source.describe(),
            mode = ?config.mode,
            rate = ?config.mode.documents_per_second(config.tick_interval()),
            "Replay worker started"
        );

        let mut decoder = FrameDecoder::new(config.max_frame_len);
        let mut router = PackRouter::new();
        let mut router_drops = 0u64;

        let mut ticker = interval(config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        scheduler.start();

        loop {
            router_drops += Self::pump(&mut decoder, &mut router, &mut scheduler);
            Self::publish(&state_tx, scheduler.state());

            if scheduler.state() == SchedulerState::Exhausted {
                break;
            }
            if scheduler.sink().is_closed() {
                debug!("Event receiver dropped, shutting down");
                scheduler.dispose();
                break;
            }

            let want_bytes = !decoder.is_exhausted()
                && scheduler.pending() < config.max_pending_documents;

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Replay worker cancelled");
                    scheduler.dispose();
                    break;
                }

                Some(command) = control_rx.recv() => {
                    trace!(?command, "Control command");
                    match command {
                        ControlCommand::Pause => scheduler.pause(),
                        ControlCommand::Resume => {
                            scheduler.resume();
                        }
                        ControlCommand::SetFullspeed(fullspeed) => {
                            scheduler.set_fullspeed(fullspeed);
                        }
                    }
                }

                _ = ticker.tick() => {
                    scheduler.drain_tick();
                }

                chunk = source.next_chunk(), if want_bytes => match chunk {
                    Ok(Some(bytes)) => {
                        trace!(len = bytes.len(), "Read chunk");
                        decoder.push(&bytes);
                    }
                    Ok(None) => decoder.finish(),
                    Err(e) => {
                        error!("Byte source failed: {}", e);
                        scheduler.dispose();
                        drop(ticker);
                        return Err(e);
                    }
                },
            }
        }

        // Stop ticking before the source is released
        drop(ticker);
        let summary = SessionSummary::collect(&decoder, router_drops, &scheduler);
        drop(source);

        info!(
            bytes = summary.bytes_read,
            packets = summary.packets_decoded,
            dropped = summary.packets_dropped,
            blocks = summary.blocks_parsed,
            "Replay worker ended"
        );
        Ok(summary)
    }

    /// Decode every complete frame currently buffered and hand documents to
    /// the scheduler. Returns the number of documents dropped by the router.
    fn pump(decoder: &mut FrameDecoder, router: &mut PackRouter, scheduler: &mut Scheduler) -> u64 {
        let mut dropped = 0;
        loop {
            match decoder.decode_next() {
                Decoded::Packet(packet) => match router.route(&packet) {
                    Ok(Some(doc)) => {
                        if scheduler.enqueue(doc).is_err() {
                            return dropped;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        dropped += 1;
                        scheduler.report(&e);
                    }
                },
                Decoded::Dropped(e) => scheduler.report(&e),
                Decoded::Drain => return dropped,
                Decoded::EndOfStream => {
                    scheduler.mark_source_exhausted();
                    return dropped;
                }
            }
        }
    }

    fn publish(state_tx: &watch::Sender<SchedulerState>, state: SchedulerState) {
        state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(from = ?*current, to = ?state, "Scheduler state changed");
            *current = state;
            true
        });
    }
}
