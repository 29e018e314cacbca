use crate::problems::jssp::FeasibilityReport;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuboError {
    /// Dimensions of a matrix, vector or bitstring disagree.
    #[error("invalid shape for {context}: expected {expected}, got {actual}")]
    InvalidShape {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite value in {0}")]
    NonFinite(String),

    #[error("expectation requested over zero samples")]
    EmptySample,

    #[error("invalid sample weight {0}")]
    InvalidWeight(f64),

    /// Decoded assignment breaks at least one hard constraint.
    #[error("decoded solution is infeasible: {0}")]
    InfeasibleDecode(FeasibilityReport),

    #[error("edge ({u}, {v}) has no weight but the instance is weighted")]
    MissingWeight { u: usize, v: usize },

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("failed to parse instance: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuboError {
    pub fn shape(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidShape {
            context,
            expected,
            actual,
        }
    }

    pub fn instance(msg: impl Into<String>) -> Self {
        Self::InvalidInstance(msg.into())
    }
}
