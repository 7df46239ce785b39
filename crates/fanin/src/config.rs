//! Run and worker configuration.
//!
//! [`RunConfig`] describes a whole run: how many workers to spawn, the ranges
//! their operation counts and delays are drawn from, and the shape of the
//! payloads they produce. [`WorkerConfig`] is the immutable, per-worker result
//! of drawing from those ranges.

use crate::{Error, Result, payload::Charset, payload::PayloadGenerator};
use core::{ops::Range, time::Duration};
use std::collections::HashSet;

/// Length of a generated worker id (`A-Z` only).
pub const WORKER_ID_LEN: usize = 3;

/// Number of distinct generated worker ids (`26^3`).
pub const MAX_GENERATED_WORKERS: usize = 26 * 26 * 26;

/// Startup delay multiplier applied to a worker's inter-operation delay.
pub const STARTUP_DELAY_FACTOR: u32 = 2;

/// Immutable configuration owned by a single worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub id: String,
    pub operation_count: u32,
    pub inter_op_delay: Duration,
    pub startup_delay: Duration,
}

impl WorkerConfig {
    /// Creates a worker config whose startup delay is
    /// [`STARTUP_DELAY_FACTOR`] times its inter-operation delay.
    pub fn new(id: impl Into<String>, operation_count: u32, inter_op_delay: Duration) -> Self {
        Self {
            id: id.into(),
            operation_count,
            inter_op_delay,
            startup_delay: inter_op_delay * STARTUP_DELAY_FACTOR,
        }
    }

    #[must_use]
    pub fn with_startup_delay(mut self, startup_delay: Duration) -> Self {
        self.startup_delay = startup_delay;
        self
    }

    /// Number of payload messages this worker emits (`operation_count + 1`).
    pub fn payload_count(&self) -> u64 {
        u64::from(self.operation_count) + 1
    }
}

/// Configuration for a complete run.
///
/// Ranges are half-open. The defaults reproduce a small interactive run: three
/// workers, 20 to 49 operations each, 200 to 499 ms between operations and
/// ten-digit numeric payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub worker_count: usize,
    pub operation_count: Range<u32>,
    pub inter_op_delay: Range<Duration>,
    pub payload_len: usize,
    pub charset: Charset,
    /// Seed for the root payload generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Capacity of the worker -> orchestrator data stream.
    pub data_buffer: usize,
    /// Capacity of the orchestrator -> aggregator stream.
    pub fanin_buffer: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            operation_count: 20..50,
            inter_op_delay: Duration::from_millis(200)..Duration::from_millis(500),
            payload_len: 10,
            charset: Charset::Numeric,
            seed: None,
            data_buffer: 1,
            fanin_buffer: 1,
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    #[must_use]
    pub fn with_operation_count(mut self, operation_count: Range<u32>) -> Self {
        self.operation_count = operation_count;
        self
    }

    #[must_use]
    pub fn with_inter_op_delay(mut self, inter_op_delay: Range<Duration>) -> Self {
        self.inter_op_delay = inter_op_delay;
        self
    }

    #[must_use]
    pub fn with_payload_len(mut self, payload_len: usize) -> Self {
        self.payload_len = payload_len;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_buffers(mut self, data_buffer: usize, fanin_buffer: usize) -> Self {
        self.data_buffer = data_buffer;
        self.fanin_buffer = fanin_buffer;
        self
    }

    /// Root generator for this run, seeded once.
    pub fn root_generator(&self) -> PayloadGenerator {
        self.seed
            .map_or_else(PayloadGenerator::from_entropy, PayloadGenerator::from_seed)
    }

    /// Checks the settings shared by every worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the payload length, charset or
    /// channel capacities are unusable.
    pub fn validate_payload(&self) -> Result<()> {
        if self.payload_len == 0 {
            return Err(Error::invalid_config("payload length must be greater than 0"));
        }
        if self.charset.symbols().is_empty() {
            return Err(Error::invalid_config("charset must not be empty"));
        }
        if self.data_buffer == 0 || self.fanin_buffer == 0 {
            return Err(Error::invalid_config(format!(
                "channel buffers must be greater than 0 (data: {}, fan-in: {})",
                self.data_buffer, self.fanin_buffer
            )));
        }
        Ok(())
    }

    /// Checks the whole configuration, including the ranges worker configs
    /// are drawn from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] on the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::invalid_config("worker count must be greater than 0"));
        }
        if self.worker_count > MAX_GENERATED_WORKERS {
            return Err(Error::invalid_config(format!(
                "worker count {} exceeds maximum allowed ({MAX_GENERATED_WORKERS})",
                self.worker_count
            )));
        }
        if self.operation_count.is_empty() {
            return Err(Error::invalid_config(format!(
                "operation count range {:?} is empty",
                self.operation_count
            )));
        }
        // Delays are drawn in whole milliseconds.
        if duration_millis(self.inter_op_delay.start) >= duration_millis(self.inter_op_delay.end) {
            return Err(Error::invalid_config(format!(
                "delay range {:?} spans less than one millisecond",
                self.inter_op_delay
            )));
        }
        self.validate_payload()
    }

    /// Draws `worker_count` worker configs with distinct random ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn generate_workers(&self, generator: &mut PayloadGenerator) -> Result<Vec<WorkerConfig>> {
        self.validate()?;

        let min_delay = duration_millis(self.inter_op_delay.start);
        let max_delay = duration_millis(self.inter_op_delay.end);
        let mut seen = HashSet::with_capacity(self.worker_count);
        let mut workers = Vec::with_capacity(self.worker_count);

        while workers.len() < self.worker_count {
            let id = generator.alpha_upper(WORKER_ID_LEN);
            if !seen.insert(id.clone()) {
                continue;
            }

            let operation_count = generator.random_int(
                u64::from(self.operation_count.start),
                u64::from(self.operation_count.end),
            )?;
            let delay_ms = generator.random_int(min_delay, max_delay)?;

            workers.push(WorkerConfig::new(
                id,
                u32::try_from(operation_count).unwrap_or(u32::MAX),
                Duration::from_millis(delay_ms),
            ));
        }

        Ok(workers)
    }
}

/// Checks a caller-supplied worker list: non-empty with distinct ids.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if the list is empty, an id is empty, or
/// an id repeats.
pub fn validate_workers(workers: &[WorkerConfig]) -> Result<()> {
    if workers.is_empty() {
        return Err(Error::invalid_config("at least one worker is required"));
    }
    let mut seen = HashSet::with_capacity(workers.len());
    for worker in workers {
        if worker.id.is_empty() {
            return Err(Error::invalid_config("worker id must not be empty"));
        }
        if !seen.insert(worker.id.as_str()) {
            return Err(Error::invalid_config(format!(
                "duplicate worker id [{}]",
                worker.id
            )));
        }
    }
    Ok(())
}

// Delay ranges come from user input in milliseconds, so saturating is fine.
fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
