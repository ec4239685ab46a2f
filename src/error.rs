//! Error types for the forecasting and advice pipeline

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub(crate) enum AnalysisError {
    /// Not enough records to run the computation. Callers treat this as a
    /// normal outcome and report it, not as a failure.
    #[error("Insufficient data: need at least {required} {unit}, found {found}")]
    InsufficientData {
        required: usize,
        found: usize,
        unit: &'static str,
    },

    #[error("Computation failed: {0}")]
    Computation(String),
}

impl AnalysisError {
    pub(crate) fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Decimal arithmetic left the representable range.
    pub(crate) fn overflow(what: &str) -> Self {
        Self::Computation(format!("{what} is out of range"))
    }
}

pub(crate) type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
