//! Power-law retry backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Exponent applied to the attempt number when computing the retry pause.
///
/// Only 1 (linear), 2 (quadratic), and 3 (cubic) are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RetryIncrement(u32);

impl RetryIncrement {
    pub const LINEAR: RetryIncrement = RetryIncrement(1);

    pub fn new(value: u32) -> CoreResult<Self> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::RetryIncrement(value))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for RetryIncrement {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl TryFrom<u32> for RetryIncrement {
    type Error = CoreError;

    fn try_from(value: u32) -> CoreResult<Self> {
        Self::new(value)
    }
}

impl From<RetryIncrement> for u32 {
    fn from(value: RetryIncrement) -> Self {
        value.0
    }
}

/// Pause before retry number `attempt` (counting from 1): `attempt ^ increment` seconds.
pub fn backoff(attempt: u32, increment: RetryIncrement) -> Duration {
    let seconds = u64::from(attempt).saturating_pow(increment.get());
    Duration::from_secs(seconds)
}
