use clap::Parser;
use core::time::Duration;
use fanin::{Charset, RunConfig};

/// Command-line arguments, with `FANIN_*` environment fallbacks.
#[derive(Parser, Debug)]
#[command(
    name = "fanin",
    version,
    about = "Spawns a pool of payload workers and fans their output into one stream."
)]
pub struct CliArgs {
    /// Number of workers to spawn
    #[arg(long, env = "FANIN_WORKERS", default_value_t = 3)]
    pub workers: usize,

    /// Minimum operations per worker (inclusive)
    #[arg(long, env = "FANIN_MIN_OPS", default_value_t = 20)]
    pub min_ops: u32,

    /// Maximum operations per worker (exclusive)
    #[arg(long, env = "FANIN_MAX_OPS", default_value_t = 50)]
    pub max_ops: u32,

    /// Minimum delay between operations in milliseconds (inclusive)
    #[arg(long, env = "FANIN_MIN_DELAY_MS", default_value_t = 200)]
    pub min_delay_ms: u64,

    /// Maximum delay between operations in milliseconds (exclusive)
    #[arg(long, env = "FANIN_MAX_DELAY_MS", default_value_t = 500)]
    pub max_delay_ms: u64,

    /// Characters per payload
    #[arg(long, env = "FANIN_PAYLOAD_LEN", default_value_t = 10)]
    pub payload_len: usize,

    /// Payload character set: numeric, alpha, alpha-upper or alpha-numeric
    #[arg(long, env = "FANIN_CHARSET", default_value_t = Charset::Numeric)]
    pub charset: Charset,

    /// Seed for reproducible runs. Seeds from OS entropy when omitted.
    #[arg(long, env = "FANIN_SEED")]
    pub seed: Option<u64>,

    /// Capacity of the worker -> orchestrator data stream
    #[arg(long, env = "FANIN_DATA_BUFFER", default_value_t = 1)]
    pub data_buffer: usize,

    /// Capacity of the orchestrator -> aggregator stream
    #[arg(long, env = "FANIN_FANIN_BUFFER", default_value_t = 1)]
    pub fanin_buffer: usize,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = fanin::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut config = Self::default()
            .with_worker_count(args.workers)
            .with_operation_count(args.min_ops..args.max_ops)
            .with_inter_op_delay(
                Duration::from_millis(args.min_delay_ms)..Duration::from_millis(args.max_delay_ms),
            )
            .with_payload_len(args.payload_len)
            .with_charset(args.charset)
            .with_buffers(args.data_buffer, args.fanin_buffer);
        if let Some(seed) = args.seed {
            config = config.with_seed(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("fanin").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = RunConfig::try_from(parse(&[])).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = RunConfig::try_from(parse(&[
            "--workers",
            "8",
            "--min-ops",
            "1",
            "--max-ops",
            "4",
            "--charset",
            "alpha-upper",
            "--seed",
            "9",
        ]))
        .unwrap();

        assert_eq!(config.worker_count, 8);
        assert_eq!(config.operation_count, 1..4);
        assert_eq!(config.charset, Charset::AlphaUpper);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let err = RunConfig::try_from(parse(&["--min-ops", "5", "--max-ops", "5"])).unwrap_err();
        assert!(matches!(err, fanin::Error::InvalidConfig { .. }));
    }

    #[test]
    fn unknown_charset_fails_to_parse() {
        let args = ["fanin", "--charset", "hex"];
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
