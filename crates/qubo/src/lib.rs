pub mod bitstring;
pub mod error;
pub mod expectation;
pub mod ising;
pub mod model;
pub mod problems;

pub use bitstring::{enumerate, Bitstring, SpinString};
pub use error::QuboError;
pub use expectation::{
    expectation_from_distribution, expectation_from_samples, EvaluationResult,
    ExpectationAccumulator,
};
pub use ising::IsingModel;
pub use model::{QuboBuilder, QuboModel};

/// Anything that assigns a cost to a full bitstring.
pub trait Objective {
    fn num_vars(&self) -> usize;
    fn cost(&self, bits: &Bitstring) -> Result<f64, QuboError>;
}

impl Objective for QuboModel {
    fn num_vars(&self) -> usize {
        self.n()
    }

    fn cost(&self, bits: &Bitstring) -> Result<f64, QuboError> {
        self.evaluate(bits)
    }
}

impl Objective for IsingModel {
    fn num_vars(&self) -> usize {
        self.n()
    }

    fn cost(&self, bits: &Bitstring) -> Result<f64, QuboError> {
        self.energy_bits(bits)
    }
}
