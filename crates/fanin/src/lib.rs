#![doc = include_str!("../README.md")]

pub mod aggregator;
pub mod config;
mod error;
mod message;
pub mod orchestrator;
pub mod payload;
pub mod worker;

pub use aggregator::{FanInAggregator, FanInReport};
pub use config::{RunConfig, WorkerConfig};
pub use error::*;
pub use message::*;
pub use orchestrator::{Orchestrator, RunReport, RunState};
pub use payload::{Charset, PayloadGenerator};
pub use worker::Worker;
