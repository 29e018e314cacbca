use crate::params::ParameterVector;
use crate::sampler::Sampler;
use qubo::{EvaluationResult, ExpectationAccumulator, IsingModel, QuboError};
use rayon::prelude::*;
use rng::ONDRng;

/// Shots folded sequentially inside one parallel work item.
pub const SHOTS_PER_BLOCK: usize = 64;

/// Running index of evaluation calls; feeds per-shot seeds.
pub type EvalTag = u64;

/// Sampling-based estimate of the Ising energy for a parameter vector.
pub struct Evaluator<S: Sampler> {
    model: IsingModel,
    sampler: S,
    shots: usize,
    seed: String,
}

impl<S: Sampler> Evaluator<S> {
    pub fn new(model: IsingModel, sampler: S, shots: usize, seed: impl Into<String>) -> Result<Self, QuboError> {
        if shots == 0 {
            return Err(QuboError::EmptySample);
        }
        Ok(Self {
            model,
            sampler,
            shots,
            seed: seed.into(),
        })
    }

    pub fn model(&self) -> &IsingModel {
        &self.model
    }

    pub fn shots(&self) -> usize {
        self.shots
    }

    /// Mean absolute cost over `shots` draws. Shot `k` of call `tag` always
    /// uses the rng seeded by `"{seed}-eval-{tag}-shot-{k}"`, and partial
    /// sums are merged in block order, so the result does not depend on how
    /// many threads run the blocks.
    pub fn evaluate(&self, params: &ParameterVector, tag: EvalTag) -> Result<EvaluationResult, QuboError> {
        self.run(params, tag, false)
    }

    /// Same estimate, with a bitstring histogram attached.
    pub fn evaluate_with_histogram(
        &self,
        params: &ParameterVector,
        tag: EvalTag,
    ) -> Result<EvaluationResult, QuboError> {
        self.run(params, tag, true)
    }

    fn run(&self, params: &ParameterVector, tag: EvalTag, histogram: bool) -> Result<EvaluationResult, QuboError> {
        let blocks = (self.shots + SHOTS_PER_BLOCK - 1) / SHOTS_PER_BLOCK;

        let partials: Vec<ExpectationAccumulator> = (0..blocks)
            .into_par_iter()
            .map(|b| -> Result<ExpectationAccumulator, QuboError> {
                let mut acc = if histogram {
                    ExpectationAccumulator::with_histogram()
                } else {
                    ExpectationAccumulator::new()
                };
                let end = ((b + 1) * SHOTS_PER_BLOCK).min(self.shots);
                for k in b * SHOTS_PER_BLOCK..end {
                    let mut rng = ONDRng::from_label(&format!("{}-eval-{}-shot-{}", self.seed, tag, k));
                    let bits = self.sampler.draw(&self.model, params, &mut rng);
                    let cost = self.model.energy_bits(&bits)?;
                    acc.push(&bits, cost);
                }
                Ok(acc)
            })
            .collect::<Result<Vec<_>, QuboError>>()?;

        let mut total = ExpectationAccumulator::new();
        for partial in partials {
            total.merge(partial);
        }
        total.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::AnnealingSampler;

    fn model() -> IsingModel {
        IsingModel::new(vec![0.3, -0.2, 0.1], [((0, 1), 1.0), ((1, 2), -0.5)], 1.0).unwrap()
    }

    #[test]
    fn evaluation_deterministic_with_seed() {
        let ev = Evaluator::new(model(), AnnealingSampler::default(), 150, "seed").unwrap();
        let p = ParameterVector::new(vec![0.7], vec![0.4]).unwrap();

        let e1 = ev.evaluate(&p, 3).unwrap();
        let e2 = ev.evaluate(&p, 3).unwrap();

        assert!((e1.energy - e2.energy).abs() < 1e-12, "e1 = {}, e2 = {}", e1.energy, e2.energy);
        assert_eq!(e1.samples, 150);
    }

    #[test]
    fn thread_count_does_not_change_result() {
        let ev = Evaluator::new(model(), AnnealingSampler::default(), 300, "threads").unwrap();
        let p = ParameterVector::new(vec![0.5, 1.1], vec![0.3, 0.2]).unwrap();

        let one = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let four = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let a = one.install(|| ev.evaluate_with_histogram(&p, 0)).unwrap();
        let b = four.install(|| ev.evaluate_with_histogram(&p, 0)).unwrap();

        assert_eq!(a.energy.to_bits(), b.energy.to_bits());
        assert_eq!(a.histogram, b.histogram);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn zero_shots_rejected() {
        assert!(matches!(
            Evaluator::new(model(), AnnealingSampler::default(), 0, "x"),
            Err(QuboError::EmptySample)
        ));
    }
}
