use crate::{CompletionSignal, Error, PayloadMessage, Result, WorkerConfig};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct WorkerTally {
    expected: u64,
    delivered: u64,
    completed: bool,
}

/// Orchestrator-owned bookkeeping for a single run.
///
/// `completed_count` only moves forward through
/// [`RunState::record_completion`], at most once per spawned worker id.
#[derive(Debug)]
pub struct RunState {
    tallies: HashMap<String, WorkerTally>,
    completed_count: usize,
    worker_count: usize,
    forwarded: u64,
}

impl RunState {
    pub fn new(workers: &[WorkerConfig]) -> Self {
        let tallies = workers
            .iter()
            .map(|w| {
                (
                    w.id.clone(),
                    WorkerTally {
                        expected: w.payload_count(),
                        delivered: 0,
                        completed: false,
                    },
                )
            })
            .collect();

        Self {
            tallies,
            completed_count: 0,
            worker_count: workers.len(),
            forwarded: 0,
        }
    }

    pub const fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of payloads accepted for forwarding so far.
    pub const fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub const fn is_finished(&self) -> bool {
        self.completed_count == self.worker_count
    }

    /// Accepts a payload if it is the next one expected from its worker.
    ///
    /// Payloads may still arrive after their worker's completion signal: the
    /// two travel on different streams.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownWorker`] if the id was never spawned.
    /// - [`Error::OutOfOrder`] if the sequence is not the next one expected.
    /// - [`Error::PayloadCountMismatch`] if the worker already delivered every
    ///   payload it was configured for. Nothing is counted in that case.
    pub fn record_payload(&mut self, msg: &PayloadMessage) -> Result<()> {
        let tally = self
            .tallies
            .get_mut(&msg.worker_id)
            .ok_or_else(|| Error::UnknownWorker {
                worker_id: msg.worker_id.clone(),
            })?;

        if u64::from(msg.sequence) != tally.delivered {
            return Err(Error::OutOfOrder {
                worker_id: msg.worker_id.clone(),
                expected: tally.delivered,
                got: u64::from(msg.sequence),
            });
        }
        if tally.delivered >= tally.expected {
            return Err(Error::PayloadCountMismatch {
                worker_id: msg.worker_id.clone(),
                expected: tally.expected,
                delivered: tally.delivered + 1,
            });
        }

        tally.delivered += 1;
        self.forwarded += 1;
        Ok(())
    }

    /// Counts a completion signal. Returns `true` once every worker has
    /// completed.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownWorker`] if the id was never spawned.
    /// - [`Error::DuplicateCompletion`] if the worker already completed. The
    ///   count is left unchanged.
    pub fn record_completion(&mut self, signal: &CompletionSignal) -> Result<bool> {
        let tally = self
            .tallies
            .get_mut(&signal.worker_id)
            .ok_or_else(|| Error::UnknownWorker {
                worker_id: signal.worker_id.clone(),
            })?;

        if tally.completed {
            return Err(Error::DuplicateCompletion {
                worker_id: signal.worker_id.clone(),
            });
        }

        tally.completed = true;
        self.completed_count += 1;
        Ok(self.is_finished())
    }

    /// Checks that every worker delivered exactly `operation_count + 1`
    /// payloads. Only meaningful once the data stream has been drained.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadCountMismatch`] for the first worker that is
    /// off.
    pub fn verify_delivered(&self) -> Result<()> {
        for (worker_id, tally) in &self.tallies {
            if tally.delivered != tally.expected {
                return Err(Error::PayloadCountMismatch {
                    worker_id: worker_id.clone(),
                    expected: tally.expected,
                    delivered: tally.delivered,
                });
            }
        }
        Ok(())
    }

    /// Payloads delivered per worker id.
    pub fn delivered(&self) -> impl Iterator<Item = (&str, u64)> {
        self.tallies
            .iter()
            .map(|(id, tally)| (id.as_str(), tally.delivered))
    }
}
