use crate::bitstring::Bitstring;
use crate::error::QuboError;
use crate::Objective;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one expectation estimate. Built fresh per call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Weighted mean cost.
    pub energy: f64,
    pub samples: u64,
    pub total_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<BTreeMap<Bitstring, u64>>,
    /// Lowest-cost bitstring seen; ties go to the lexicographically smallest.
    pub best: Option<(Bitstring, f64)>,
}

/// Running weighted sum of sample costs. Samples themselves are not kept
/// unless a histogram was requested.
#[derive(Clone, Debug, Default)]
pub struct ExpectationAccumulator {
    sum: f64,
    weight: f64,
    count: u64,
    histogram: Option<BTreeMap<Bitstring, u64>>,
    best: Option<(Bitstring, f64)>,
}

impl ExpectationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_histogram() -> Self {
        Self {
            histogram: Some(BTreeMap::new()),
            ..Self::default()
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0 && self.weight > 0.0).then(|| self.sum / self.weight)
    }

    /// Cost only; for streams where the bitstring is not needed.
    pub fn push_cost(&mut self, cost: f64) {
        self.sum += cost;
        self.weight += 1.0;
        self.count += 1;
    }

    pub fn push(&mut self, bits: &Bitstring, cost: f64) {
        self.push_cost(cost);
        if let Some(h) = self.histogram.as_mut() {
            *h.entry(bits.clone()).or_insert(0) += 1;
        }
        self.offer_best(bits, cost);
    }

    /// Weighted sample, e.g. one row of a probability table. Zero-weight
    /// rows are ignored.
    pub fn push_weighted(&mut self, bits: &Bitstring, cost: f64, weight: f64) -> Result<(), QuboError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(QuboError::InvalidWeight(weight));
        }
        if weight == 0.0 {
            return Ok(());
        }
        self.sum += weight * cost;
        self.weight += weight;
        self.count += 1;
        self.offer_best(bits, cost);
        Ok(())
    }

    /// Order-independent combination of two partial accumulators.
    pub fn merge(&mut self, other: ExpectationAccumulator) {
        self.sum += other.sum;
        self.weight += other.weight;
        self.count += other.count;
        match (self.histogram.as_mut(), other.histogram) {
            (Some(mine), Some(theirs)) => {
                for (bits, c) in theirs {
                    *mine.entry(bits).or_insert(0) += c;
                }
            }
            (None, Some(theirs)) => self.histogram = Some(theirs),
            _ => {}
        }
        if let Some((bits, cost)) = other.best {
            self.offer_best(&bits, cost);
        }
    }

    fn offer_best(&mut self, bits: &Bitstring, cost: f64) {
        let better = match &self.best {
            None => true,
            Some((b, c)) => cost < *c || (cost == *c && bits < b),
        };
        if better {
            self.best = Some((bits.clone(), cost));
        }
    }

    pub fn finish(self) -> Result<EvaluationResult, QuboError> {
        let energy = self.mean().ok_or(QuboError::EmptySample)?;
        Ok(EvaluationResult {
            energy,
            samples: self.count,
            total_weight: self.weight,
            histogram: self.histogram,
            best: self.best,
        })
    }
}

/// Sample mean of `objective` over a multiset of bitstrings.
pub fn expectation_from_samples<'a, O, I>(objective: &O, samples: I) -> Result<EvaluationResult, QuboError>
where
    O: Objective + ?Sized,
    I: IntoIterator<Item = &'a Bitstring>,
{
    let mut acc = ExpectationAccumulator::with_histogram();
    for bits in samples {
        acc.push(bits, objective.cost(bits)?);
    }
    acc.finish()
}

/// Weighted mean of `objective` over an explicit probability table.
/// Weights need not be normalized.
pub fn expectation_from_distribution<O>(
    objective: &O,
    table: &[(Bitstring, f64)],
) -> Result<EvaluationResult, QuboError>
where
    O: Objective + ?Sized,
{
    let mut acc = ExpectationAccumulator::new();
    for (bits, p) in table {
        acc.push_weighted(bits, objective.cost(bits)?, *p)?;
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bitstring {
        s.parse().unwrap()
    }

    #[test]
    fn empty_accumulator_is_an_error() {
        let err = ExpectationAccumulator::new().finish().unwrap_err();
        assert!(matches!(err, QuboError::EmptySample));
    }

    #[test]
    fn streaming_mean() {
        let mut acc = ExpectationAccumulator::new();
        for c in [1.0, 2.0, 3.0, 6.0] {
            acc.push_cost(c);
        }
        let r = acc.finish().unwrap();
        assert_eq!(r.samples, 4);
        assert!((r.energy - 3.0).abs() < 1e-12);
        assert!(r.histogram.is_none());
    }

    #[test]
    fn ties_go_to_smallest_bitstring() {
        let mut acc = ExpectationAccumulator::new();
        acc.push(&b("10"), -1.0);
        acc.push(&b("01"), -1.0);
        acc.push(&b("11"), 0.0);
        let r = acc.finish().unwrap();
        assert_eq!(r.best, Some((b("01"), -1.0)));
    }

    #[test]
    fn merge_is_order_independent_for_counts() {
        let mut a = ExpectationAccumulator::with_histogram();
        a.push(&b("00"), 1.0);
        let mut c = ExpectationAccumulator::with_histogram();
        c.push(&b("00"), 1.0);
        c.push(&b("11"), 3.0);

        let mut left = a.clone();
        left.merge(c.clone());
        let mut right = c;
        right.merge(a);

        let l = left.finish().unwrap();
        let r = right.finish().unwrap();
        assert_eq!(l.histogram, r.histogram);
        assert_eq!(l.samples, 3);
        assert_eq!(l.histogram.unwrap()[&b("00")], 2);
        assert!((l.energy - r.energy).abs() < 1e-12);
    }

    #[test]
    fn negative_weight_rejected() {
        let mut acc = ExpectationAccumulator::new();
        assert!(matches!(
            acc.push_weighted(&b("0"), 1.0, -0.5),
            Err(QuboError::InvalidWeight(_))
        ));
    }
}
