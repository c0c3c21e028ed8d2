//! Pure numeric indicators over price sequences.

pub mod rsi;

use std::fmt;

pub use rsi::rolling_rsi;

/// Reason an indicator could not be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    /// Fewer prices than the lookback requires.
    InsufficientData { needed: usize, actual: usize },
    /// A lookback window of zero.
    InvalidWindow,
}

impl fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData { needed, actual } => {
                write!(f, "insufficient data: need {needed} prices, got {actual}")
            }
            Self::InvalidWindow => write!(f, "indicator window must be at least 1"),
        }
    }
}

impl std::error::Error for IndicatorError {}
