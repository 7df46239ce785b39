//! Single-consumer end of the fan-in.
//!
//! The [`FanInAggregator`] drains the aggregation stream and renders each
//! [`PayloadMessage`] as one line on its output sink. It keeps reading until
//! the orchestrator closes the stream (drops its sender), then returns a
//! [`FanInReport`] so the orchestrator knows every forwarded message has been
//! written.

use crate::{Error, PayloadMessage, Result};
use std::io::Write;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Prefix that distinguishes aggregated payload lines from log output.
pub const LINE_PREFIX: &str = "  > ";

/// What the aggregator hands back after the stream is closed and drained.
#[derive(Debug)]
pub struct FanInReport<W> {
    /// Number of payload lines written.
    pub received: u64,
    /// The output sink, returned so callers can inspect or reuse it.
    pub sink: W,
}

#[derive(Debug)]
pub struct FanInAggregator<W> {
    sink: W,
    received: u64,
}

impl<W> FanInAggregator<W>
where
    W: Write + Send + 'static,
{
    pub const fn new(sink: W) -> Self {
        Self { sink, received: 0 }
    }

    /// Receives until `rx` is closed and drained.
    ///
    /// # Errors
    ///
    /// - [`Error::Sink`] if a line cannot be written or flushed.
    /// - [`Error::Cancelled`] if `shutdown_token` fires before closure. The
    ///   remaining messages are not drained.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<PayloadMessage>,
        shutdown_token: CancellationToken,
    ) -> Result<FanInReport<W>> {
        loop {
            tokio::select! {
                biased;
                () = shutdown_token.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("FanIn reader cancelled after {} messages", self.received);
                    return Err(Error::Cancelled);
                }
                msg = rx.recv() => match msg {
                    Some(msg) => self.write_line(&msg)?,
                    None => break,
                },
            }
        }

        self.sink.flush().map_err(|e| Error::Sink {
            context: format!("failed to flush output: {e}"),
        })?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "FanIn Channel Reader is done reading from channel ({} messages)",
            self.received
        );

        Ok(FanInReport {
            received: self.received,
            sink: self.sink,
        })
    }

    fn write_line(&mut self, msg: &PayloadMessage) -> Result<()> {
        writeln!(self.sink, "{LINE_PREFIX}{msg}").map_err(|e| Error::Sink {
            context: format!("failed to write msg-{} of [{}]: {e}", msg.sequence, msg.worker_id),
        })?;
        self.received += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn drains_everything_sent_before_closure() {
        let (tx, rx) = mpsc::channel(8);
        for seq in 0..3 {
            tx.send(PayloadMessage::new("ABC", seq, "42")).await.unwrap();
        }
        drop(tx);

        let report = FanInAggregator::new(Vec::<u8>::new())
            .run(rx, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.received, 3);
        let output = String::from_utf8(report.sink).unwrap();
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![
                "  > [id:ABC]: msg-0: (42)",
                "  > [id:ABC]: msg-1: (42)",
                "  > [id:ABC]: msg-2: (42)",
            ]
        );
    }

    #[tokio::test]
    async fn keeps_reading_while_the_stream_is_open() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(FanInAggregator::new(Vec::<u8>::new()).run(rx, CancellationToken::new()));

        tx.send(PayloadMessage::new("A", 0, "1")).await.unwrap();
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        tx.send(PayloadMessage::new("A", 1, "2")).await.unwrap();
        drop(tx);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.received, 2);
    }

    #[tokio::test]
    async fn write_failure_is_a_sink_error() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(PayloadMessage::new("A", 0, "1")).await.unwrap();
        drop(tx);

        let err = FanInAggregator::new(BrokenSink)
            .run(rx, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sink { .. }));
    }

    #[tokio::test]
    async fn cancellation_stops_an_open_stream() {
        let (_tx, rx) = mpsc::channel::<PayloadMessage>(1);
        let token = CancellationToken::new();
        token.cancel();

        let err = FanInAggregator::new(Vec::<u8>::new())
            .run(rx, token)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }
}
