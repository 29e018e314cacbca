use qubo::QuboError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// The energy trace produced a NaN or infinity. Fatal for the run.
    #[error("optimizer diverged at iteration {iteration}: energy = {energy}")]
    Diverged { iteration: usize, energy: f64 },

    #[error("invalid parameter vector: {0}")]
    InvalidParameters(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Evaluation(#[from] QuboError),
}
