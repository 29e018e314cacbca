use crate::error::OptimizerError;
use rng::ONDRng;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Cost angles `gamma` and mixer angles `beta`, one of each per layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterVector {
    gamma: Vec<f64>,
    beta: Vec<f64>,
}

impl ParameterVector {
    pub fn new(gamma: Vec<f64>, beta: Vec<f64>) -> Result<Self, OptimizerError> {
        if gamma.is_empty() {
            return Err(OptimizerError::InvalidParameters("depth must be at least 1".into()));
        }
        if gamma.len() != beta.len() {
            return Err(OptimizerError::InvalidParameters(format!(
                "gamma has {} entries but beta has {}",
                gamma.len(),
                beta.len()
            )));
        }
        if gamma.iter().chain(beta.iter()).any(|v| !v.is_finite()) {
            return Err(OptimizerError::InvalidParameters("non-finite angle".into()));
        }
        Ok(Self { gamma, beta })
    }

    /// `beta = pi/4`, `gamma = pi / (4 * mean_degree)` on every layer.
    pub fn warm_start(p: usize, mean_degree: f64) -> Result<Self, OptimizerError> {
        let degree = if mean_degree > 0.0 { mean_degree } else { 1.0 };
        Self::new(vec![PI / (4.0 * degree); p], vec![FRAC_PI_4; p])
    }

    /// `gamma` uniform in `[0, pi)`, `beta` uniform in `[0, pi/2)`.
    pub fn random(p: usize, rng: &mut ONDRng) -> Result<Self, OptimizerError> {
        let gamma = (0..p).map(|_| rng.next_range(0.0, PI, b"INIT_GAMMA")).collect();
        let beta = (0..p).map(|_| rng.next_range(0.0, FRAC_PI_2, b"INIT_BETA")).collect();
        Self::new(gamma, beta)
    }

    pub fn depth(&self) -> usize {
        self.gamma.len()
    }

    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    /// `(gamma_l, beta_l)` per layer.
    pub fn layers(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.gamma.iter().copied().zip(self.beta.iter().copied())
    }

    /// `[gamma.., beta..]`.
    pub fn to_flat(&self) -> Vec<f64> {
        let mut v = self.gamma.clone();
        v.extend_from_slice(&self.beta);
        v
    }

    pub fn from_flat(flat: &[f64]) -> Result<Self, OptimizerError> {
        if flat.len() % 2 != 0 {
            return Err(OptimizerError::InvalidParameters(format!(
                "flat vector has odd length {}",
                flat.len()
            )));
        }
        let p = flat.len() / 2;
        Self::new(flat[..p].to_vec(), flat[p..].to_vec())
    }

    /// Copy with coordinate `i` of the flat form moved by `delta`.
    pub fn shifted(&self, i: usize, delta: f64) -> Self {
        let mut out = self.clone();
        let p = self.depth();
        if i < p {
            out.gamma[i] += delta;
        } else {
            out.beta[i - p] += delta;
        }
        out
    }
}
