use crate::{Error, Result};
use core::{fmt, str::FromStr};

pub const NUMERIC: &str = "0123456789";
pub const ALPHA: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const ALPHA_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const ALPHA_NUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The set of characters a payload string is drawn from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Charset {
    /// `0-9`
    #[default]
    Numeric,
    /// `a-z` and `A-Z`
    Alpha,
    /// `A-Z`
    AlphaUpper,
    /// `a-z`, `A-Z` and `0-9`
    AlphaNumeric,
    /// Any non-empty set of characters.
    Custom(String),
}

impl Charset {
    /// Builds a custom charset, rejecting an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `symbols` is empty.
    pub fn custom(symbols: impl Into<String>) -> Result<Self> {
        let symbols = symbols.into();
        if symbols.is_empty() {
            return Err(Error::invalid_config("charset must not be empty"));
        }
        Ok(Self::Custom(symbols))
    }

    pub fn symbols(&self) -> &str {
        match self {
            Self::Numeric => NUMERIC,
            Self::Alpha => ALPHA,
            Self::AlphaUpper => ALPHA_UPPER,
            Self::AlphaNumeric => ALPHA_NUMERIC,
            Self::Custom(symbols) => symbols,
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Alpha => write!(f, "alpha"),
            Self::AlphaUpper => write!(f, "alpha-upper"),
            Self::AlphaNumeric => write!(f, "alpha-numeric"),
            Self::Custom(symbols) => write!(f, "custom({symbols})"),
        }
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "numeric" | "num" => Ok(Self::Numeric),
            "alpha" => Ok(Self::Alpha),
            "alpha-upper" | "alphacap" => Ok(Self::AlphaUpper),
            "alpha-numeric" | "alphanum" => Ok(Self::AlphaNumeric),
            other => Err(Error::invalid_config(format!(
                "unknown charset `{other}` (expected numeric, alpha, alpha-upper or alpha-numeric)"
            ))),
        }
    }
}
