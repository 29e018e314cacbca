use crate::bitstring::Bitstring;
use crate::error::QuboError;

/// Minimize `sum_ij Q_ij x_i x_j + sum_i q_i x_i + c` over binary `x`.
///
/// `Q` is kept exactly as supplied. Since `x_i^2 = x_i` the diagonal behaves
/// like a linear term, and both triangles contribute to a pair: the
/// effective coefficient of `x_i x_j` (i < j) is `Q_ij + Q_ji`.
#[derive(Clone, Debug, PartialEq)]
pub struct QuboModel {
    n: usize,
    quadratic: Vec<f64>,
    linear: Vec<f64>,
    offset: f64,
}

impl QuboModel {
    /// Build from a dense matrix given as rows.
    pub fn new(quadratic: Vec<Vec<f64>>, linear: Vec<f64>) -> Result<Self, QuboError> {
        let n = quadratic.len();
        for row in &quadratic {
            if row.len() != n {
                return Err(QuboError::shape("quadratic matrix row", n, row.len()));
            }
        }
        Self::from_dense(n, quadratic.into_iter().flatten().collect(), linear)
    }

    /// Build from a row-major `n * n` buffer.
    pub fn from_dense(n: usize, quadratic: Vec<f64>, linear: Vec<f64>) -> Result<Self, QuboError> {
        if n == 0 {
            return Err(QuboError::shape("QUBO dimension", 1, 0));
        }
        if quadratic.len() != n * n {
            return Err(QuboError::shape("quadratic matrix", n * n, quadratic.len()));
        }
        if linear.len() != n {
            return Err(QuboError::shape("linear vector", n, linear.len()));
        }
        if let Some(k) = quadratic.iter().position(|v| !v.is_finite()) {
            return Err(QuboError::NonFinite(format!("Q[{}][{}]", k / n, k % n)));
        }
        if let Some(i) = linear.iter().position(|v| !v.is_finite()) {
            return Err(QuboError::NonFinite(format!("q[{}]", i)));
        }

        Ok(Self {
            n,
            quadratic,
            linear,
            offset: 0.0,
        })
    }

    pub fn with_offset(mut self, offset: f64) -> Result<Self, QuboError> {
        if !offset.is_finite() {
            return Err(QuboError::NonFinite("offset".into()));
        }
        self.offset = offset;
        Ok(self)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn quadratic(&self, i: usize, j: usize) -> f64 {
        self.quadratic[i * self.n + j]
    }

    pub fn linear(&self, i: usize) -> f64 {
        self.linear[i]
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Coefficient multiplying `x_i` once the diagonal is folded in.
    pub fn diagonal_coefficient(&self, i: usize) -> f64 {
        self.linear[i] + self.quadratic(i, i)
    }

    /// Coefficient multiplying `x_i x_j` for `i != j`, both triangles folded.
    pub fn pair_coefficient(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i != j);
        self.quadratic(i, j) + self.quadratic(j, i)
    }

    pub fn evaluate(&self, x: &Bitstring) -> Result<f64, QuboError> {
        x.expect_len(self.n, "bitstring")?;

        let mut c = self.offset;
        for i in 0..self.n {
            if !x.get(i) {
                continue;
            }
            c += self.diagonal_coefficient(i);
            for j in (i + 1)..self.n {
                if x.get(j) {
                    c += self.pair_coefficient(i, j);
                }
            }
        }
        Ok(c)
    }
}

/// Accumulates penalty and objective terms before freezing a `QuboModel`.
#[derive(Clone, Debug)]
pub struct QuboBuilder {
    n: usize,
    quadratic: Vec<f64>,
    linear: Vec<f64>,
    offset: f64,
}

impl QuboBuilder {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            quadratic: vec![0.0; n * n],
            linear: vec![0.0; n],
            offset: 0.0,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn add_linear(&mut self, i: usize, v: f64) -> &mut Self {
        self.linear[i] += v;
        self
    }

    /// Adds `v * x_i * x_j`. Pairs are stored in the upper triangle.
    pub fn add_quadratic(&mut self, i: usize, j: usize, v: f64) -> &mut Self {
        if i == j {
            self.linear[i] += v;
        } else {
            let (a, b) = if i < j { (i, j) } else { (j, i) };
            self.quadratic[a * self.n + b] += v;
        }
        self
    }

    pub fn add_offset(&mut self, v: f64) -> &mut Self {
        self.offset += v;
        self
    }

    pub fn build(self) -> Result<QuboModel, QuboError> {
        QuboModel::from_dense(self.n, self.quadratic, self.linear)?.with_offset(self.offset)
    }
}
