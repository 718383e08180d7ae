use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::cycle::SegmentKind;

/// Every state change in the cycle produces an Event.
/// Observers (logging, tests) receive them through an [`EventSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SegmentStarted {
        kind: SegmentKind,
        ordinal: u32,
        duration_secs: u64,
    },
    SegmentFinished {
        kind: SegmentKind,
        ordinal: u32,
    },
    Paused {
        remaining_secs: u64,
    },
    Resumed {
        remaining_secs: u64,
    },
    /// Waiting for the user to press return.
    AwaitingAdvance,
    Advanced,
}

/// Optional fan-out of engine events. Sending never blocks and a dropped
/// receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<Event>>,
}

impl EventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        tracing::debug!(?event, "engine event");
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
