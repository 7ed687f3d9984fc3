//! Document to draw event translation

use std::sync::Arc;
use tracing::trace;

use crate::types::{DrawEvent, DrawLineEvent, DrawPointEvent, Document, Point};

/// Whether documents echoed back from the local client are replayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EchoPolicy {
    /// Replay every document
    #[default]
    ReplayAll,

    /// Skip documents whose `clientid` equals the given id
    SuppressOwn { client_id: String },
}

impl EchoPolicy {
    pub fn from_client_id(client_id: Option<String>) -> Self {
        match client_id {
            Some(client_id) => EchoPolicy::SuppressOwn { client_id },
            None => EchoPolicy::ReplayAll,
        }
    }

    fn suppresses(&self, client_id: &str) -> bool {
        match self {
            EchoPolicy::ReplayAll => false,
            EchoPolicy::SuppressOwn { client_id: own } => own == client_id,
        }
    }
}

/// Turns block documents into chained point and line events
#[derive(Debug, Clone, Default)]
pub struct Translator {
    policy: EchoPolicy,
}

impl Translator {
    pub fn new(policy: EchoPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EchoPolicy {
        &self.policy
    }

    /// Translate one document.
    ///
    /// Emits one point event for the first point and one line event for
    /// every following point. Non-block documents, empty blocks and
    /// suppressed echoes produce no events.
    pub fn translate(&self, doc: &Document) -> Vec<DrawEvent> {
        if !doc.is_block() {
            trace!(action = %doc.action, "Skipping non-block document");
            return Vec::new();
        }
        if self.policy.suppresses(&doc.clientid) {
            trace!(client_id = %doc.clientid, "Skipping own echoed document");
            return Vec::new();
        }

        let Some((first, rest)) = doc.block.split_first() else {
            return Vec::new();
        };

        let brush_info = Arc::new(doc.brush.clone());
        let layer: Arc<str> = Arc::from(doc.layer.as_str());
        let client_id: Arc<str> = Arc::from(doc.clientid.as_str());

        let mut events = Vec::with_capacity(doc.block.len());
        let mut start = Point::new(first.x, first.y);
        events.push(DrawEvent::Point(DrawPointEvent {
            point: start,
            pressure: first.pressure_or_default(),
            brush_info: Arc::clone(&brush_info),
            layer: Arc::clone(&layer),
            client_id: Arc::clone(&client_id),
        }));

        for next in rest {
            let end = Point::new(next.x, next.y);
            events.push(DrawEvent::Line(DrawLineEvent {
                start,
                end,
                pressure: next.pressure_or_default(),
                brush_info: Arc::clone(&brush_info),
                layer: Arc::clone(&layer),
                client_id: Arc::clone(&client_id),
            }));
            start = end;
        }

        events
    }
}
