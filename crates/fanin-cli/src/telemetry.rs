//! Log output for the `fanin` binary.
//!
//! Events from the `fanin` library (built with its `tracing` feature) are
//! printed through `tracing_subscriber::fmt` with an RFC 3339 UTC timestamp.
//! Aggregated payload lines are written to stdout separately by the
//! aggregator and carry a `"  > "` prefix instead of a timestamp.
//!
//! The filter defaults to `info` and can be overridden with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug fanin --workers 8
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339()),
        )
        .try_init()?;

    Ok(())
}
