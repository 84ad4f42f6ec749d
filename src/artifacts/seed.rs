//! Render seeds
//!
//! A seed is `0x` followed by exactly 64 hex digits. Case is preserved.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Total length of a seed, including the `0x` prefix
pub const SEED_LEN: usize = 66;

/// Literal seed prefix
pub const SEED_PREFIX: &str = "0x";

/// Number of hex digits used as the filesystem correlation token
pub const SHORT_SEED_LEN: usize = 8;

const INVALID_SEED: &str =
    "Invalid seed format. Seed must be a 64-character hexadecimal string starting with 0x.";

/// Check the seed format without allocating
pub fn validate_seed(seed: &str) -> bool {
    seed.len() == SEED_LEN
        && seed.starts_with(SEED_PREFIX)
        && seed[SEED_PREFIX.len()..]
            .bytes()
            .all(|b| b.is_ascii_hexdigit())
}

/// A validated render seed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seed(String);

impl Seed {
    /// Validate and wrap a seed string
    pub fn parse(seed: &str) -> Result<Self> {
        if validate_seed(seed) {
            Ok(Self(seed.to_string()))
        } else {
            Err(Error::InvalidInput(INVALID_SEED.to_string()))
        }
    }

    /// The full seed, `0x` prefix included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 64 hex digits without the prefix, as passed to the CLI
    pub fn hex(&self) -> &str {
        &self.0[SEED_PREFIX.len()..]
    }

    /// First 8 hex digits, used to correlate files with a seed.
    ///
    /// Not unique across seeds.
    pub fn short(&self) -> &str {
        &self.hex()[..SHORT_SEED_LEN]
    }
}

impl FromStr for Seed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Seed {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
