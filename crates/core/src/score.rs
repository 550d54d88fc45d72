//! Credit score clamped to the 300..=850 band

use serde::{Deserialize, Serialize};
use std::fmt;

/// A credit score. No constructor can produce a value outside `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct CreditScore(i32);

impl CreditScore {
    pub const MIN: i32 = 300;
    pub const MAX: i32 = 850;

    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    #[inline]
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// Shift by a signed delta, clamping the result
    pub fn adjust(&self, delta: i32) -> Self {
        Self::clamped(self.0.saturating_add(delta))
    }

    /// Lower the score to at most `ceiling` (never raises it)
    pub fn cap_at(&self, ceiling: i32) -> Self {
        Self::clamped(self.0.min(ceiling))
    }
}

impl From<i32> for CreditScore {
    fn from(value: i32) -> Self {
        Self::clamped(value)
    }
}

impl From<CreditScore> for i32 {
    fn from(score: CreditScore) -> Self {
        score.0
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
