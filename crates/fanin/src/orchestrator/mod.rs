//! Run orchestration: spawning, multiplexing and completion detection.
//!
//! The [`Orchestrator`] owns a run from start to finish:
//!
//! 1. Build (or accept) one [`WorkerConfig`] per worker with distinct ids.
//! 2. Spawn the [`FanInAggregator`] and every [`Worker`] as Tokio tasks.
//! 3. Multiplex the data stream and the control stream with `tokio::select!`
//!    (random branch choice, so neither stream has priority). Payloads are
//!    forwarded unmodified to the aggregation stream; completion signals are
//!    counted in [`RunState`].
//! 4. After the Nth distinct completion, drain whatever payloads are still
//!    buffered in the data stream, then close the aggregation stream.
//! 5. Wait for the aggregator to report that it drained and returned, and
//!    join every worker task.
//!
//! Any failure cancels the run's [`CancellationToken`], so every task returns
//! before the error reaches the caller.

mod state;

pub use state::RunState;

use crate::{
    CompletionSignal, Error, PayloadMessage, Result, RunConfig, WorkerConfig,
    aggregator::{FanInAggregator, FanInReport},
    config::validate_workers,
    payload::PayloadGenerator,
    worker::Worker,
};
use core::time::Duration;
use std::{io::Write, time::Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport<W> {
    /// Completion signals counted. Always equal to the worker count.
    pub completed: usize,
    /// Payloads forwarded to the aggregation stream.
    pub forwarded: u64,
    /// Payloads delivered per worker, sorted by worker id.
    pub delivered: Vec<(String, u64)>,
    /// The aggregator's report, including its output sink.
    pub output: FanInReport<W>,
    pub elapsed: Duration,
}

/// Spawns workers and the aggregator, and decides when a run is finished.
#[derive(Debug)]
pub struct Orchestrator {
    config: RunConfig,
    workers: Vec<WorkerConfig>,
    root: PayloadGenerator,
    shutdown_token: CancellationToken,
}

impl Orchestrator {
    /// Validates `config` and draws its worker configs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is rejected.
    /// Nothing is spawned in that case.
    pub fn new(config: RunConfig) -> Result<Self> {
        let mut root = config.root_generator();
        let workers = config.generate_workers(&mut root)?;
        Ok(Self {
            config,
            workers,
            root,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Uses caller-supplied worker configs instead of drawing them from the
    /// ranges in `config`. `config.worker_count` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `workers` is empty, repeats an id,
    /// or the payload settings in `config` are invalid.
    pub fn with_workers(config: RunConfig, workers: Vec<WorkerConfig>) -> Result<Self> {
        config.validate_payload()?;
        validate_workers(&workers)?;
        Ok(Self {
            root: config.root_generator(),
            config,
            workers,
            shutdown_token: CancellationToken::new(),
        })
    }

    pub fn workers(&self) -> &[WorkerConfig] {
        &self.workers
    }

    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Token that aborts the run when cancelled. A cancelled run returns
    /// [`Error::Cancelled`] once every task has returned.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs every worker to completion and writes one line per payload to
    /// `sink`.
    ///
    /// Returns only after all N completions were counted, the aggregation
    /// stream was closed, the aggregator returned, and every worker task was
    /// joined.
    ///
    /// # Errors
    ///
    /// Returns the root cause of the first fatal failure. See [`Error`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(workers = self.workers.len())))]
    pub async fn run<W>(self, sink: W) -> Result<RunReport<W>>
    where
        W: Write + Send + 'static,
    {
        let Self {
            config,
            workers,
            mut root,
            shutdown_token,
        } = self;
        let start = Instant::now();

        #[cfg(feature = "tracing")]
        tracing::info!("Orchestrator creating {} workers...", workers.len());

        let (data_tx, mut data_rx) = mpsc::channel(config.data_buffer);
        let (control_tx, mut control_rx) = mpsc::channel(workers.len());
        let (fanin_tx, fanin_rx) = mpsc::channel(config.fanin_buffer);

        let aggregator =
            tokio::spawn(FanInAggregator::new(sink).run(fanin_rx, shutdown_token.clone()));

        let mut state = RunState::new(&workers);
        let mut handles = Vec::with_capacity(workers.len());
        for worker_config in workers {
            let worker = Worker::new(
                worker_config,
                root.fork(),
                config.payload_len,
                config.charset.clone(),
            );
            let id = worker.id().to_string();
            let handle = tokio::spawn(worker.run(
                data_tx.clone(),
                control_tx.clone(),
                shutdown_token.clone(),
            ));
            handles.push((id, handle));
        }
        // Only workers hold producer handles from here on, so both inbound
        // streams close once every worker has returned.
        drop(data_tx);
        drop(control_tx);

        #[cfg(feature = "tracing")]
        tracing::info!("Orchestrator listening on data channel for worker data");

        let outcome = multiplex(
            &mut state,
            &mut data_rx,
            &mut control_rx,
            &fanin_tx,
            &shutdown_token,
        )
        .await;

        if outcome.is_err() {
            shutdown_token.cancel();
        }

        // Closing the aggregation stream is the aggregator's cue to finish.
        drop(fanin_tx);
        drop(data_rx);
        drop(control_rx);

        let aggregated = aggregator.await.unwrap_or_else(|e| {
            Err(Error::TaskFailed {
                context: format!("aggregator: {e}"),
            })
        });

        let worker_results = futures::future::join_all(handles.into_iter().map(
            |(id, handle)| async move {
                handle.await.unwrap_or_else(|e| {
                    Err(Error::TaskFailed {
                        context: format!("worker [{id}]: {e}"),
                    })
                })
            },
        ))
        .await;

        let mut errors = Vec::new();
        if let Err(e) = outcome {
            errors.push(e);
        }
        if let Err(e) = &aggregated {
            errors.push(e.clone());
        }
        errors.extend(worker_results.into_iter().filter_map(|r| r.err()));

        if let Some(err) = root_cause(errors) {
            #[cfg(feature = "tracing")]
            tracing::error!("Run aborted: {err}");
            return Err(err);
        }

        let output = aggregated?;
        let mut delivered: Vec<_> = state
            .delivered()
            .map(|(id, count)| (id.to_string(), count))
            .collect();
        delivered.sort();

        let report = RunReport {
            completed: state.completed_count(),
            forwarded: state.forwarded(),
            delivered,
            output,
            elapsed: start.elapsed(),
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Run complete: {} workers, {} messages in {:?}",
            report.completed,
            report.forwarded,
            report.elapsed
        );

        Ok(report)
    }
}

/// The orchestrator's run loop.
///
/// Returns `Ok(())` once every worker has completed exactly once, every
/// payload has been forwarded, and each worker's delivered count matches its
/// configuration.
async fn multiplex(
    state: &mut RunState,
    data_rx: &mut mpsc::Receiver<PayloadMessage>,
    control_rx: &mut mpsc::Receiver<CompletionSignal>,
    fanin_tx: &mpsc::Sender<PayloadMessage>,
    shutdown_token: &CancellationToken,
) -> Result<()> {
    // A worker drops its data sender before signalling, so the data stream
    // can close while the last completion signals are still queued.
    let mut data_open = true;

    while !state.is_finished() {
        tokio::select! {
            () = shutdown_token.cancelled() => return Err(Error::Cancelled),
            msg = data_rx.recv(), if data_open => match msg {
                Some(msg) => forward(state, fanin_tx, msg).await?,
                None => data_open = false,
            },
            signal = control_rx.recv() => match signal {
                Some(signal) => {
                    state.record_completion(&signal)?;
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        "Orchestrator has detected complete signal from worker [{}]. Total-comp=({})",
                        signal.worker_id,
                        state.completed_count()
                    );
                }
                None => {
                    return Err(Error::channel(format!(
                        "control stream closed after {} of {} completions",
                        state.completed_count(),
                        state.worker_count()
                    )));
                }
            },
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Orchestrator has determined that ALL {} workers are done sending on data channel",
        state.worker_count()
    );

    // Payloads still buffered behind the final completion signals.
    while data_open {
        tokio::select! {
            () = shutdown_token.cancelled() => return Err(Error::Cancelled),
            msg = data_rx.recv() => match msg {
                Some(msg) => forward(state, fanin_tx, msg).await?,
                None => data_open = false,
            },
        }
    }

    state.verify_delivered()
}

async fn forward(
    state: &mut RunState,
    fanin_tx: &mpsc::Sender<PayloadMessage>,
    msg: PayloadMessage,
) -> Result<()> {
    state.record_payload(&msg)?;
    fanin_tx
        .send(msg)
        .await
        .map_err(|e| Error::channel(format!("aggregation stream closed: {e}")))
}

/// Picks the error to surface when several tasks failed together.
///
/// Cancellation and closed streams are usually consequences of another
/// failure, so any other error takes precedence.
fn root_cause(mut errors: Vec<Error>) -> Option<Error> {
    let idx = errors
        .iter()
        .position(|e| !matches!(e, Error::Cancelled | Error::ChannelError { .. }))
        .unwrap_or(0);
    (!errors.is_empty()).then(|| errors.swap_remove(idx))
}
