//! Messages exchanged between workers, the orchestrator and the aggregator.

use core::fmt;

/// One unit of worker output.
///
/// Created by a worker on each iteration and moved, unmodified, through the
/// data stream, the orchestrator and the aggregation stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadMessage {
    pub worker_id: String,
    pub sequence: u32,
    pub value: String,
}

impl PayloadMessage {
    pub fn new(worker_id: impl Into<String>, sequence: u32, value: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            sequence,
            value: value.into(),
        }
    }
}

impl fmt::Display for PayloadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[id:{}]: msg-{}: ({})",
            self.worker_id, self.sequence, self.value
        )
    }
}

/// Sent exactly once by a worker after its last [`PayloadMessage`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompletionSignal {
    pub worker_id: String,
}

impl CompletionSignal {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
        }
    }
}
