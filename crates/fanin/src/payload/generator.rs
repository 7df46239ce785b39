use super::{ALPHA, ALPHA_NUMERIC, ALPHA_UPPER, Charset, NUMERIC};
use crate::{Error, Result};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seeded source of random payload strings and integers.
///
/// A generator is seeded exactly once, at construction, and is never
/// reseeded. It is not shared: each worker owns its own instance (see
/// [`PayloadGenerator::fork`]), so concurrent workers never touch the same
/// random state and no locking is needed.
#[derive(Clone, Debug)]
pub struct PayloadGenerator {
    rng: StdRng,
}

impl PayloadGenerator {
    /// Creates a generator with a fixed seed. Two generators built from the
    /// same seed produce the same sequence of values.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Derives an independent child generator seeded from this one.
    ///
    /// Forking from a fixed-seed parent is deterministic, which keeps a whole
    /// run reproducible while every worker still owns its own state.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.rng.random())
    }

    /// Returns `length` characters drawn uniformly from `charset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `charset` has no symbols.
    pub fn generate(&mut self, length: usize, charset: &Charset) -> Result<String> {
        let symbols = charset.symbols();
        if symbols.is_empty() {
            return Err(Error::invalid_config("charset must not be empty"));
        }
        if symbols.is_ascii() {
            return Ok(self.sample_ascii(length, symbols.as_bytes()));
        }

        let count = symbols.chars().count();
        Ok((0..length)
            .filter_map(|_| symbols.chars().nth(self.rng.random_range(0..count)))
            .collect())
    }

    // `symbols` must be non-empty ASCII.
    fn sample_ascii(&mut self, length: usize, symbols: &[u8]) -> String {
        (0..length)
            .map(|_| char::from(symbols[self.rng.random_range(0..symbols.len())]))
            .collect()
    }

    /// Returns an integer drawn uniformly from `[min, max)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the range is empty.
    pub fn random_int(&mut self, min: u64, max: u64) -> Result<u64> {
        if min >= max {
            return Err(Error::invalid_config(format!(
                "empty range [{min}, {max})"
            )));
        }
        Ok(self.rng.random_range(min..max))
    }

    pub fn numeric(&mut self, length: usize) -> String {
        self.sample_ascii(length, NUMERIC.as_bytes())
    }

    pub fn alpha(&mut self, length: usize) -> String {
        self.sample_ascii(length, ALPHA.as_bytes())
    }

    pub fn alpha_upper(&mut self, length: usize) -> String {
        self.sample_ascii(length, ALPHA_UPPER.as_bytes())
    }

    pub fn alpha_numeric(&mut self, length: usize) -> String {
        self.sample_ascii(length, ALPHA_NUMERIC.as_bytes())
    }
}

impl Default for PayloadGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
