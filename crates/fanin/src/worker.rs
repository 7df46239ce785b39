use crate::{
    CompletionSignal, Error, PayloadMessage, Result, WorkerConfig,
    payload::{Charset, PayloadGenerator},
};
use core::time::Duration;
use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;

/// A producer task that emits `operation_count + 1` payloads followed by
/// exactly one [`CompletionSignal`].
///
/// Each worker owns its own [`PayloadGenerator`], so no random state is
/// shared between concurrently running workers.
#[derive(Debug)]
pub struct Worker {
    config: WorkerConfig,
    generator: PayloadGenerator,
    payload_len: usize,
    charset: Charset,
}

impl Worker {
    pub const fn new(
        config: WorkerConfig,
        generator: PayloadGenerator,
        payload_len: usize,
        charset: Charset,
    ) -> Self {
        Self {
            config,
            generator,
            payload_len,
            charset,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Runs the worker to completion.
    ///
    /// This function is designed to be spawned as a Tokio task.
    ///
    /// # Arguments
    ///
    /// - `data_tx`: Data stream. A send blocks until the orchestrator has room
    ///   for the message, which is the run's only backpressure point.
    /// - `control_tx`: Control stream, used once for the completion signal.
    /// - `shutdown_token`: Run-wide token. Every sleep and send also waits on
    ///   it so a cancelled run never leaves a worker stalled.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if `shutdown_token` fires first.
    /// - [`Error::ChannelError`] if either stream is closed.
    pub async fn run(
        mut self,
        data_tx: mpsc::Sender<PayloadMessage>,
        control_tx: mpsc::Sender<CompletionSignal>,
        shutdown_token: CancellationToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Worker [{}] is starting after sleeping ({}) ms. Performing {} operations...",
            self.config.id,
            self.config.startup_delay.as_millis(),
            self.config.operation_count
        );

        pause(self.config.startup_delay, &shutdown_token).await?;

        for sequence in 0..=self.config.operation_count {
            let value = self.generator.generate(self.payload_len, &self.charset)?;
            let msg = PayloadMessage::new(self.config.id.clone(), sequence, value);

            tokio::select! {
                biased;
                () = shutdown_token.cancelled() => return Err(Error::Cancelled),
                res = data_tx.send(msg) => res.map_err(|_| {
                    Error::channel(format!(
                        "data stream closed while worker [{}] was sending msg-{sequence}",
                        self.config.id
                    ))
                })?,
            }

            pause(self.config.inter_op_delay, &shutdown_token).await?;
        }

        // Every payload is queued before the signal goes out.
        drop(data_tx);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Worker [{}] has completed and is sending its ID on control channel...",
            self.config.id
        );

        let signal = CompletionSignal::new(self.config.id.clone());
        tokio::select! {
            biased;
            () = shutdown_token.cancelled() => Err(Error::Cancelled),
            res = control_tx.send(signal) => res.map_err(|_| {
                Error::channel(format!(
                    "control stream closed before worker [{}] could signal completion",
                    self.config.id
                ))
            }),
        }
    }
}

async fn pause(duration: Duration, shutdown_token: &CancellationToken) -> Result<()> {
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        () = shutdown_token.cancelled() => Err(Error::Cancelled),
        () = sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(id: &str, operation_count: u32) -> Worker {
        Worker::new(
            WorkerConfig::new(id, operation_count, Duration::ZERO),
            PayloadGenerator::from_seed(1),
            10,
            Charset::Numeric,
        )
    }

    #[tokio::test]
    async fn emits_operation_count_plus_one_payloads_then_one_signal() {
        let (data_tx, mut data_rx) = mpsc::channel(16);
        let (control_tx, mut control_rx) = mpsc::channel(1);

        worker("ABC", 3)
            .run(data_tx, control_tx, CancellationToken::new())
            .await
            .unwrap();

        let mut sequences = Vec::new();
        while let Some(msg) = data_rx.recv().await {
            assert_eq!(msg.worker_id, "ABC");
            assert_eq!(msg.value.len(), 10);
            assert!(msg.value.chars().all(|c| c.is_ascii_digit()));
            sequences.push(msg.sequence);
        }
        assert_eq!(sequences, vec![0, 1, 2, 3]);

        assert_eq!(control_rx.recv().await, Some(CompletionSignal::new("ABC")));
        assert_eq!(control_rx.recv().await, None);
    }

    #[tokio::test]
    async fn zero_operations_still_sends_one_payload() {
        let (data_tx, mut data_rx) = mpsc::channel(4);
        let (control_tx, mut control_rx) = mpsc::channel(1);

        worker("Z", 0)
            .run(data_tx, control_tx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(data_rx.recv().await.map(|m| m.sequence), Some(0));
        assert_eq!(data_rx.recv().await, None);
        assert!(control_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn closed_data_stream_is_a_channel_error() {
        let (data_tx, data_rx) = mpsc::channel(1);
        let (control_tx, _control_rx) = mpsc::channel(1);
        drop(data_rx);

        let err = worker("ABC", 2)
            .run(data_tx, control_tx, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChannelError { .. }));
    }

    #[tokio::test]
    async fn cancellation_releases_a_blocked_send() {
        // Capacity 1 and no reader: the second send blocks forever.
        let (data_tx, _data_rx) = mpsc::channel(1);
        let (control_tx, _control_rx) = mpsc::channel(1);
        let token = CancellationToken::new();

        let handle = tokio::spawn(worker("ABC", 5).run(data_tx, control_tx, token.clone()));
        tokio::task::yield_now().await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn largest_operation_count_still_emits_payloads() {
        let (data_tx, mut data_rx) = mpsc::channel(4);
        let (control_tx, mut control_rx) = mpsc::channel(1);
        let token = CancellationToken::new();

        let handle = tokio::spawn(worker("MAX", u32::MAX).run(data_tx, control_tx, token.clone()));
        for expected in 0..3 {
            assert_eq!(data_rx.recv().await.map(|m| m.sequence), Some(expected));
        }
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(Error::Cancelled));
        assert!(control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_charset_fails_before_sending() {
        let (data_tx, mut data_rx) = mpsc::channel(1);
        let (control_tx, mut control_rx) = mpsc::channel(1);
        let worker = Worker::new(
            WorkerConfig::new("E", 1, Duration::ZERO),
            PayloadGenerator::from_seed(1),
            10,
            Charset::Custom(String::new()),
        );

        let err = worker
            .run(data_tx, control_tx, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(data_rx.recv().await, None);
        assert_eq!(control_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_before_start_and_between_operations() {
        let (data_tx, mut data_rx) = mpsc::channel(8);
        let (control_tx, mut control_rx) = mpsc::channel(1);
        let config = WorkerConfig::new("SLO", 2, Duration::from_millis(100));
        let worker = Worker::new(config, PayloadGenerator::from_seed(2), 4, Charset::AlphaUpper);

        let start = tokio::time::Instant::now();
        tokio::spawn(worker.run(data_tx, control_tx, CancellationToken::new()));

        let first = data_rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert!(first.value.chars().all(|c| c.is_ascii_uppercase()));

        assert!(control_rx.recv().await.is_some());
        // startup (200) + three inter-op pauses (3 x 100)
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }
}
