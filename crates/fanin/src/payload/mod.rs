//! Random payload generation.
//!
//! [`PayloadGenerator`] draws fixed-length strings from a [`Charset`] and
//! integers from half-open ranges. Each worker owns its own generator, forked
//! from the run's root generator.

mod charset;
mod generator;

pub use charset::*;
pub use generator::*;
