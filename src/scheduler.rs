//! Replay scheduler
//!
//! The scheduler owns the queue of pending documents and decides when they
//! are drained into draw events. It is a plain state machine with no clock
//! of its own: the [`Driver`](crate::driver::Driver) calls
//! [`ReplayScheduler::drain_tick`] on its timer and forwards documents,
//! control commands and the end-of-source signal.
//!
//! ```text
//! Idle --start--> Running <--pause/resume--> Paused
//!                    |
//!                    +-- source exhausted and queue empty --> Exhausted
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::translate::Translator;
use crate::types::{Document, ReplayEvent, ReplayMode};
use crate::{ReplayError, Result};

/// Receiver of everything the scheduler emits
pub trait EventSink {
    fn emit(&mut self, event: ReplayEvent);
}

impl EventSink for Vec<ReplayEvent> {
    fn emit(&mut self, event: ReplayEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::UnboundedSender<ReplayEvent> {
    fn emit(&mut self, event: ReplayEvent) {
        // A dropped receiver means nobody is watching; keep replaying to the end
        let _ = self.send(event);
    }
}

/// Lifecycle state of a replay session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Exhausted,
}

/// What one drain pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Documents that produced draw events
    pub blocks_parsed: usize,

    /// The canvas changed and a repaint is due
    pub repaint: bool,

    /// This pass emitted the terminal `ArchiveParsed` notification
    pub archive_parsed: bool,
}

impl DrainOutcome {
    fn merge(self, other: DrainOutcome) -> DrainOutcome {
        DrainOutcome {
            blocks_parsed: self.blocks_parsed + other.blocks_parsed,
            repaint: self.repaint || other.repaint,
            archive_parsed: self.archive_parsed || other.archive_parsed,
        }
    }
}

/// Counters kept by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub documents_enqueued: u64,
    pub documents_drained: u64,
    pub blocks_parsed: u64,
    pub events_emitted: u64,
    pub diagnostics: u64,
}

/// Replay scheduler state machine
#[derive(Debug)]
pub struct ReplayScheduler<S: EventSink> {
    queue: VecDeque<Document>,
    translator: Translator,
    sink: S,
    mode: ReplayMode,
    started: bool,
    paused: bool,
    source_exhausted: bool,
    end_signaled: bool,
    disposed: bool,
    stats: SchedulerStats,
}

impl<S: EventSink> ReplayScheduler<S> {
    pub fn new(mode: ReplayMode, translator: Translator, sink: S) -> Self {
        Self {
            queue: VecDeque::new(),
            translator,
            sink,
            mode,
            started: false,
            paused: false,
            source_exhausted: false,
            end_signaled: false,
            disposed: false,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.end_signaled {
            SchedulerState::Exhausted
        } else if !self.started {
            SchedulerState::Idle
        } else if self.paused {
            SchedulerState::Paused
        } else {
            SchedulerState::Running
        }
    }

    pub fn mode(&self) -> ReplayMode {
        self.mode
    }

    /// Documents waiting to be drained
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Leave `Idle`. In fullspeed mode anything already queued is drained.
    pub fn start(&mut self) -> DrainOutcome {
        if self.disposed || self.started {
            return DrainOutcome::default();
        }
        self.started = true;
        debug!(mode = ?self.mode, pending = self.queue.len(), "Scheduler started");
        self.drain_if_eager()
    }

    /// Append a document to the queue.
    ///
    /// Fails with [`ReplayError::SessionClosed`] once the session is
    /// exhausted or disposed.
    pub fn enqueue(&mut self, doc: Document) -> Result<DrainOutcome> {
        if self.disposed || self.end_signaled {
            return Err(ReplayError::SessionClosed);
        }
        self.queue.push_back(doc);
        self.stats.documents_enqueued += 1;
        trace!(pending = self.queue.len(), "Document enqueued");
        Ok(self.drain_if_eager())
    }

    /// Periodic drain.
    ///
    /// Throttled mode dequeues at most one document, fullspeed mode drains
    /// the whole queue. No-op unless running.
    pub fn drain_tick(&mut self) -> DrainOutcome {
        if self.disposed || self.state() != SchedulerState::Running {
            return DrainOutcome::default();
        }
        match self.mode.per_tick_budget() {
            Some(budget) => self.drain(budget),
            None => self.drain(usize::MAX),
        }
    }

    pub fn pause(&mut self) {
        if !self.paused && !self.disposed {
            debug!("Scheduler paused");
            self.paused = true;
        }
    }

    /// Resume draining. In fullspeed mode everything queued while paused is
    /// drained immediately.
    pub fn resume(&mut self) -> DrainOutcome {
        if !self.paused || self.disposed {
            return DrainOutcome::default();
        }
        debug!(pending = self.queue.len(), "Scheduler resumed");
        self.paused = false;
        self.drain_if_eager()
    }

    pub fn set_fullspeed(&mut self, fullspeed: bool) -> DrainOutcome {
        let mode = ReplayMode::from_fullspeed(fullspeed);
        if mode == self.mode || self.disposed {
            return DrainOutcome::default();
        }
        debug!(?mode, "Replay mode changed");
        self.mode = mode;
        self.drain_if_eager()
    }

    /// Record that the byte source will deliver nothing more.
    ///
    /// `ArchiveParsed` fires once the queue is empty, never before.
    pub fn mark_source_exhausted(&mut self) -> DrainOutcome {
        if self.disposed || self.source_exhausted {
            return DrainOutcome::default();
        }
        debug!(pending = self.queue.len(), "Source exhausted");
        self.source_exhausted = true;
        self.drain_if_eager()
    }

    /// Surface a recoverable decode error to the consumer
    pub fn report(&mut self, error: &ReplayError) {
        if self.disposed {
            return;
        }
        if let Some(diagnostic) = error.diagnostic() {
            self.stats.diagnostics += 1;
            self.sink.emit(ReplayEvent::Diagnostic(diagnostic));
        }
    }

    /// Stop accepting work. Later calls become no-ops and the queue is dropped.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!(dropped = self.queue.len(), "Scheduler disposed");
        self.disposed = true;
        self.queue.clear();
    }

    fn drain_if_eager(&mut self) -> DrainOutcome {
        if self.mode.is_fullspeed() && self.state() == SchedulerState::Running {
            self.drain(usize::MAX)
        } else {
            DrainOutcome::default()
        }
    }

    fn drain(&mut self, budget: usize) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();

        for _ in 0..budget {
            let Some(doc) = self.queue.pop_front() else {
                break;
            };
            self.stats.documents_drained += 1;

            let events = self.translator.translate(&doc);
            if events.is_empty() {
                continue;
            }

            self.stats.events_emitted += events.len() as u64;
            for event in events {
                self.sink.emit(ReplayEvent::Draw(event));
            }
            self.sink.emit(ReplayEvent::BlockParsed { sequence: self.stats.blocks_parsed });
            self.stats.blocks_parsed += 1;
            outcome.blocks_parsed += 1;
        }
        outcome.repaint = outcome.blocks_parsed > 0;

        outcome.merge(self.finish_if_drained())
    }

    fn finish_if_drained(&mut self) -> DrainOutcome {
        if !self.source_exhausted || self.end_signaled || !self.queue.is_empty() {
            return DrainOutcome::default();
        }
        self.end_signaled = true;
        info!(
            documents = self.stats.documents_drained,
            blocks = self.stats.blocks_parsed,
            events = self.stats.events_emitted,
            "Archive parsed"
        );
        self.sink.emit(ReplayEvent::ArchiveParsed);
        DrainOutcome { archive_parsed: true, ..DrainOutcome::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockPoint, BrushInfo, DrawEvent, Point};

    fn doc(client: &str, points: &[(i32, i32)]) -> Document {
        Document {
            action: "block".into(),
            clientid: client.into(),
            layer: "0".into(),
            brush: BrushInfo::new("basicbrush"),
            block: points.iter().map(|&(x, y)| BlockPoint::new(x, y)).collect(),
        }
    }

    fn scheduler(mode: ReplayMode) -> ReplayScheduler<Vec<ReplayEvent>> {
        let mut s = ReplayScheduler::new(mode, Translator::default(), Vec::new());
        s.start();
        s
    }

    fn parsed_sequences(events: &[ReplayEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::BlockParsed { sequence } => Some(*sequence),
                _ => None,
            })
            .collect()
    }

    fn first_points(events: &[ReplayEvent]) -> Vec<Point> {
        events
            .iter()
            .filter_map(|e| match e {
                ReplayEvent::Draw(DrawEvent::Point(p)) => Some(p.point),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn throttled_ticks_drain_one_document_in_fifo_order() {
        let mut s = scheduler(ReplayMode::Throttled);
        for i in 0..3 {
            let outcome = s.enqueue(doc("a", &[(i, i), (i + 1, i + 1)])).unwrap();
            assert_eq!(outcome, DrainOutcome::default());
        }
        assert!(s.sink().is_empty());

        for expected in 1..=3 {
            let outcome = s.drain_tick();
            assert_eq!(outcome.blocks_parsed, 1);
            assert!(outcome.repaint);
            assert_eq!(parsed_sequences(s.sink()).len(), expected);
        }

        assert_eq!(parsed_sequences(s.sink()), vec![0, 1, 2]);
        assert_eq!(first_points(s.sink()), vec![Point::new(0, 0), Point::new(1, 1), Point::new(2, 2)]);
        assert_eq!(s.drain_tick(), DrainOutcome::default());
    }

    #[test]
    fn fullspeed_drains_on_enqueue() {
        let mut s = scheduler(ReplayMode::Fullspeed);
        let outcome = s.enqueue(doc("a", &[(1, 1)])).unwrap();
        assert_eq!(outcome.blocks_parsed, 1);
        assert_eq!(s.pending(), 0);
        assert_eq!(s.sink().len(), 2);
    }

    #[test]
    fn idle_scheduler_buffers_until_started() {
        let mut s = ReplayScheduler::new(ReplayMode::Fullspeed, Translator::default(), Vec::new());
        assert_eq!(s.state(), SchedulerState::Idle);
        s.enqueue(doc("a", &[(1, 1)])).unwrap();
        s.enqueue(doc("a", &[(2, 2)])).unwrap();
        assert_eq!(s.drain_tick(), DrainOutcome::default());
        assert_eq!(s.pending(), 2);

        let outcome = s.start();
        assert_eq!(outcome.blocks_parsed, 2);
        assert_eq!(s.state(), SchedulerState::Running);
    }

    #[test]
    fn pause_suppresses_draining_and_resume_drains_in_order() {
        let mut s = scheduler(ReplayMode::Fullspeed);
        s.pause();
        assert_eq!(s.state(), SchedulerState::Paused);

        for i in 0..4 {
            s.enqueue(doc("a", &[(i, 0)])).unwrap();
        }
        assert_eq!(s.drain_tick(), DrainOutcome::default());
        assert!(s.sink().is_empty());

        let outcome = s.resume();
        assert_eq!(outcome.blocks_parsed, 4);
        assert_eq!(
            first_points(s.sink()),
            (0..4).map(|i| Point::new(i, 0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn archive_parsed_waits_for_the_queue() {
        let mut s = scheduler(ReplayMode::Throttled);
        s.enqueue(doc("a", &[(1, 1)])).unwrap();
        s.enqueue(doc("a", &[(2, 2)])).unwrap();
        assert_eq!(s.mark_source_exhausted(), DrainOutcome::default());
        assert_eq!(s.state(), SchedulerState::Running);

        assert!(!s.drain_tick().archive_parsed);
        let last = s.drain_tick();
        assert!(last.archive_parsed);
        assert_eq!(last.blocks_parsed, 1);
        assert_eq!(s.state(), SchedulerState::Exhausted);
        assert_eq!(s.sink().last(), Some(&ReplayEvent::ArchiveParsed));
    }

    #[test]
    fn archive_parsed_fires_exactly_once() {
        let mut s = scheduler(ReplayMode::Fullspeed);
        s.enqueue(doc("a", &[(1, 1)])).unwrap();
        assert!(s.mark_source_exhausted().archive_parsed);
        s.mark_source_exhausted();
        s.drain_tick();
        s.drain_tick();

        let count = s.sink().iter().filter(|e| e.is_archive_parsed()).count();
        assert_eq!(count, 1);
        assert!(matches!(s.enqueue(doc("a", &[(1, 1)])), Err(ReplayError::SessionClosed)));
    }

    #[test]
    fn paused_scheduler_does_not_finish() {
        let mut s = scheduler(ReplayMode::Fullspeed);
        s.pause();
        s.mark_source_exhausted();
        assert_eq!(s.drain_tick(), DrainOutcome::default());
        assert_eq!(s.state(), SchedulerState::Paused);

        assert!(s.resume().archive_parsed);
    }

    #[test]
    fn no_op_documents_emit_nothing_and_do_not_block() {
        let mut s = scheduler(ReplayMode::Throttled);
        let mut erase = doc("a", &[(1, 1)]);
        erase.action = "erase".into();
        s.enqueue(erase).unwrap();
        s.enqueue(doc("a", &[])).unwrap();
        s.enqueue(doc("a", &[(9, 9)])).unwrap();

        assert_eq!(s.drain_tick().blocks_parsed, 0);
        assert_eq!(s.drain_tick().blocks_parsed, 0);
        assert_eq!(s.drain_tick().blocks_parsed, 1);
        assert_eq!(first_points(s.sink()), vec![Point::new(9, 9)]);
        assert_eq!(s.stats().documents_drained, 3);
    }

    #[test]
    fn switching_to_fullspeed_drains_backlog() {
        let mut s = scheduler(ReplayMode::Throttled);
        for i in 0..5 {
            s.enqueue(doc("a", &[(i, i)])).unwrap();
        }
        assert_eq!(s.set_fullspeed(true).blocks_parsed, 5);
        assert_eq!(s.mode(), ReplayMode::Fullspeed);
    }

    #[test]
    fn diagnostics_reach_the_sink() {
        let mut s = scheduler(ReplayMode::Throttled);
        s.report(&ReplayError::decompression("bad"));
        s.report(&ReplayError::SessionClosed);
        assert_eq!(s.sink().len(), 1);
        assert_eq!(s.stats().diagnostics, 1);
    }

    #[test]
    fn disposed_scheduler_ignores_everything() {
        let mut s = scheduler(ReplayMode::Throttled);
        s.enqueue(doc("a", &[(1, 1)])).unwrap();
        s.dispose();

        assert_eq!(s.drain_tick(), DrainOutcome::default());
        assert_eq!(s.mark_source_exhausted(), DrainOutcome::default());
        assert!(s.enqueue(doc("a", &[(1, 1)])).is_err());
        assert!(s.sink().is_empty());
        assert_eq!(s.pending(), 0);
    }
}
