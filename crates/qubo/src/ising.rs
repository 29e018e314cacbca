use crate::bitstring::{Bitstring, SpinString};
use crate::error::QuboError;
use crate::model::QuboModel;
use std::collections::BTreeMap;

/// `E0 + sum_i h_i s_i + sum_{i<j} J_ij s_i s_j` over spins `s_i` in {-1, +1}.
#[derive(Clone, Debug, PartialEq)]
pub struct IsingModel {
    /// local fields h_i * Z_i
    z_fields: Vec<f64>,
    /// couplings J_ij * Z_i Z_j, keyed with i < j
    zz_couplings: BTreeMap<(usize, usize), f64>,
    offset: f64,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl IsingModel {
    pub fn new(
        z_fields: Vec<f64>,
        couplings: impl IntoIterator<Item = ((usize, usize), f64)>,
        offset: f64,
    ) -> Result<Self, QuboError> {
        let n = z_fields.len();
        if n == 0 {
            return Err(QuboError::shape("Ising field vector", 1, 0));
        }
        if let Some(i) = z_fields.iter().position(|v| !v.is_finite()) {
            return Err(QuboError::NonFinite(format!("h[{}]", i)));
        }
        if !offset.is_finite() {
            return Err(QuboError::NonFinite("offset".into()));
        }

        let mut zz = BTreeMap::new();
        for ((i, j), v) in couplings {
            if i == j {
                return Err(QuboError::instance(format!("self coupling J[{}][{}]", i, i)));
            }
            if i >= n || j >= n {
                return Err(QuboError::shape("coupling index", n, i.max(j) + 1));
            }
            if !v.is_finite() {
                return Err(QuboError::NonFinite(format!("J[{}][{}]", i, j)));
            }
            *zz.entry((i.min(j), i.max(j))).or_insert(0.0) += v;
        }
        zz.retain(|_, v| *v != 0.0);

        Ok(Self::assemble(z_fields, zz, offset))
    }

    /// Substitute `x_i = (1 - s_i) / 2` into the QUBO objective.
    pub fn from_qubo(qubo: &QuboModel) -> Self {
        let n = qubo.n();
        let mut h = vec![0.0; n];
        let mut zz = BTreeMap::new();
        let mut offset = qubo.offset();

        for i in 0..n {
            // a x_i = a/2 - (a/2) s_i
            let a = qubo.diagonal_coefficient(i);
            offset += a / 2.0;
            h[i] -= a / 2.0;
        }

        for i in 0..n {
            for j in (i + 1)..n {
                // b x_i x_j = (b/4)(1 - s_i - s_j + s_i s_j)
                let b = qubo.pair_coefficient(i, j);
                if b == 0.0 {
                    continue;
                }
                let quarter = b / 4.0;
                offset += quarter;
                h[i] -= quarter;
                h[j] -= quarter;
                zz.insert((i, j), quarter);
            }
        }

        log::debug!(
            "ising conversion: n={} couplings={} offset={}",
            n,
            zz.len(),
            offset
        );

        Self::assemble(h, zz, offset)
    }

    fn assemble(z_fields: Vec<f64>, zz_couplings: BTreeMap<(usize, usize), f64>, offset: f64) -> Self {
        let mut adjacency = vec![Vec::new(); z_fields.len()];
        for (&(i, j), &v) in &zz_couplings {
            adjacency[i].push((j, v));
            adjacency[j].push((i, v));
        }
        Self {
            z_fields,
            zz_couplings,
            offset,
            adjacency,
        }
    }

    pub fn n(&self) -> usize {
        self.z_fields.len()
    }

    pub fn fields(&self) -> &[f64] {
        &self.z_fields
    }

    pub fn field(&self, i: usize) -> f64 {
        self.z_fields[i]
    }

    /// `J_ij`, symmetric in its arguments; zero when absent.
    pub fn coupling(&self, i: usize, j: usize) -> f64 {
        let key = (i.min(j), i.max(j));
        self.zz_couplings.get(&key).copied().unwrap_or(0.0)
    }

    pub fn couplings(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.zz_couplings.iter().map(|(&k, &v)| (k, v))
    }

    pub fn num_couplings(&self) -> usize {
        self.zz_couplings.len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// `sum h_i s_i + sum J_ij s_i s_j`, without the constant offset.
    pub fn energy(&self, spins: &SpinString) -> Result<f64, QuboError> {
        if spins.len() != self.n() {
            return Err(QuboError::shape("spin string", self.n(), spins.len()));
        }
        let s = spins.as_slice();

        let mut e = 0.0;
        for (i, &hi) in self.z_fields.iter().enumerate() {
            e += hi * f64::from(s[i]);
        }
        for (&(i, j), &jij) in &self.zz_couplings {
            e += jij * f64::from(s[i] * s[j]);
        }
        Ok(e)
    }

    /// Absolute cost of a bitstring: offset plus spin energy. Equals the
    /// originating QUBO's value for the same bits.
    pub fn energy_bits(&self, bits: &Bitstring) -> Result<f64, QuboError> {
        Ok(self.offset + self.energy(&bits.to_spins())?)
    }

    /// `h_i + sum_j J_ij s_j`.
    pub fn local_field(&self, i: usize, spins: &[i8]) -> f64 {
        let mut f = self.z_fields[i];
        for &(j, jij) in &self.adjacency[i] {
            f += jij * f64::from(spins[j]);
        }
        f
    }

    /// Energy change caused by flipping spin `i`.
    pub fn flip_delta(&self, i: usize, spins: &[i8]) -> f64 {
        -2.0 * f64::from(spins[i]) * self.local_field(i, spins)
    }

    /// Mean number of couplings per spin.
    pub fn mean_degree(&self) -> f64 {
        2.0 * self.zz_couplings.len() as f64 / self.n() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_delta_matches_energy_difference() {
        let m = IsingModel::new(vec![0.5, -1.0, 0.25], [((0, 1), 1.0), ((2, 1), -0.5)], 0.0).unwrap();
        let s = vec![1i8, -1, 1];
        let before = m.energy(&SpinString::new(s.clone()).unwrap()).unwrap();
        for i in 0..3 {
            let mut t = s.clone();
            t[i] = -t[i];
            let after = m.energy(&SpinString::new(t).unwrap()).unwrap();
            assert!((after - before - m.flip_delta(i, &s)).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_self_coupling() {
        assert!(IsingModel::new(vec![0.0, 0.0], [((1, 1), 1.0)], 0.0).is_err());
    }

    #[test]
    fn couplings_are_order_insensitive() {
        let m = IsingModel::new(vec![0.0, 0.0], [((1, 0), 2.0)], 0.0).unwrap();
        assert_eq!(m.coupling(0, 1), 2.0);
        assert_eq!(m.coupling(1, 0), 2.0);
        assert_eq!(m.num_couplings(), 1);
    }
}
