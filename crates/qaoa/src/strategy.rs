use crate::params::ParameterVector;
use rng::ONDRng;
use serde::Serialize;

/// One evaluated candidate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trial {
    pub iteration: usize,
    pub params: ParameterVector,
    pub energy: f64,
    pub accepted: bool,
}

/// Every `(params, energy)` pair evaluated during a run, in order.
#[derive(Clone, Debug, Default)]
pub struct History {
    trials: Vec<Trial>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn last(&self) -> Option<&Trial> {
        self.trials.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter()
    }

    /// Lowest-energy trial; the earliest wins a tie.
    pub fn best(&self) -> Option<&Trial> {
        self.trials.iter().fold(None, |best: Option<&Trial>, t| match best {
            Some(b) if b.energy <= t.energy => Some(b),
            _ => Some(t),
        })
    }

    /// Up to `k` trials with distinct parameters, lowest energy first.
    pub fn top_distinct(&self, k: usize) -> Vec<&Trial> {
        let mut sorted: Vec<&Trial> = self.trials.iter().collect();
        sorted.sort_by(|a, b| a.energy.total_cmp(&b.energy));

        let mut out: Vec<&Trial> = Vec::with_capacity(k);
        for t in sorted {
            if out.len() == k {
                break;
            }
            if out.iter().all(|o| o.params != t.params) {
                out.push(t);
            }
        }
        out
    }
}

/// Black-box minimizer step: propose the next candidate from what has been
/// seen so far, then decide whether the loop should move to it.
pub trait StepStrategy {
    fn name(&self) -> &'static str;

    fn propose(&mut self, current: &ParameterVector, history: &History, rng: &mut ONDRng) -> ParameterVector;

    fn accept(&mut self, candidate_energy: f64, current_energy: f64, rng: &mut ONDRng) -> bool;

    /// Strategy has nothing left to try at useful resolution.
    fn settled(&self) -> bool {
        false
    }
}

impl<T: StepStrategy + ?Sized> StepStrategy for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn propose(&mut self, current: &ParameterVector, history: &History, rng: &mut ONDRng) -> ParameterVector {
        (**self).propose(current, history, rng)
    }

    fn accept(&mut self, candidate_energy: f64, current_energy: f64, rng: &mut ONDRng) -> bool {
        (**self).accept(candidate_energy, current_energy, rng)
    }

    fn settled(&self) -> bool {
        (**self).settled()
    }
}

/// Compass search. Polls `+step` and `-step` along each coordinate of the
/// flat vector in turn, accepts strict improvements, and shrinks the step
/// after a full poll without one.
#[derive(Clone, Debug)]
pub struct PatternSearch {
    step: f64,
    min_step: f64,
    shrink: f64,
    cursor: usize,
    directions: usize,
    improved: bool,
}

impl PatternSearch {
    pub fn new(step: f64, min_step: f64) -> Self {
        Self {
            step,
            min_step,
            shrink: 0.5,
            cursor: 0,
            directions: 0,
            improved: false,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

impl Default for PatternSearch {
    fn default() -> Self {
        Self::new(0.25, 1e-3)
    }
}

impl StepStrategy for PatternSearch {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn propose(&mut self, current: &ParameterVector, _history: &History, _rng: &mut ONDRng) -> ParameterVector {
        self.directions = 2 * current.to_flat().len();
        if self.cursor >= self.directions {
            self.cursor = 0;
        }
        let coord = self.cursor / 2;
        let sign = if self.cursor % 2 == 0 { 1.0 } else { -1.0 };
        current.shifted(coord, sign * self.step)
    }

    fn accept(&mut self, candidate_energy: f64, current_energy: f64, _rng: &mut ONDRng) -> bool {
        let better = candidate_energy < current_energy;
        self.improved |= better;
        self.cursor += 1;
        if self.cursor >= self.directions {
            if !self.improved {
                self.step *= self.shrink;
            }
            self.cursor = 0;
            self.improved = false;
        }
        better
    }

    fn settled(&self) -> bool {
        self.step < self.min_step
    }
}

/// Random perturbation with Metropolis acceptance and geometric cooling.
#[derive(Clone, Debug)]
pub struct AnnealingPerturbation {
    step: f64,
    temperature: f64,
    cooling: f64,
    min_temperature: f64,
}

impl AnnealingPerturbation {
    pub fn new(step: f64, temperature: f64, cooling: f64) -> Self {
        Self {
            step,
            temperature,
            cooling,
            min_temperature: 1e-9,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Default for AnnealingPerturbation {
    fn default() -> Self {
        Self::new(0.2, 1.0, 0.95)
    }
}

impl StepStrategy for AnnealingPerturbation {
    fn name(&self) -> &'static str {
        "anneal"
    }

    fn propose(&mut self, current: &ParameterVector, _history: &History, rng: &mut ONDRng) -> ParameterVector {
        let flat: Vec<f64> = current
            .to_flat()
            .into_iter()
            .map(|x| x + rng.next_range(-self.step, self.step, b"PERTURB"))
            .collect();
        // Same length as a valid vector, finite shifts: cannot fail.
        ParameterVector::from_flat(&flat).unwrap_or_else(|_| current.clone())
    }

    fn accept(&mut self, candidate_energy: f64, current_energy: f64, rng: &mut ONDRng) -> bool {
        let accept = if candidate_energy <= current_energy {
            true
        } else {
            let p = (-(candidate_energy - current_energy) / self.temperature).exp();
            rng.next_f64(b"ANNEAL_ACCEPT") < p
        };
        self.temperature = (self.temperature * self.cooling).max(self.min_temperature);
        accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(g: f64, b: f64) -> ParameterVector {
        ParameterVector::new(vec![g], vec![b]).unwrap()
    }

    #[test]
    fn pattern_search_polls_each_direction_then_shrinks() {
        let mut s = PatternSearch::new(1.0, 0.1);
        let mut rng = ONDRng::new(b"ps");
        let h = History::new();
        let x = pv(0.0, 0.0);

        let proposals: Vec<Vec<f64>> = (0..4)
            .map(|_| {
                let c = s.propose(&x, &h, &mut rng);
                assert!(!s.accept(1.0, 0.0, &mut rng));
                c.to_flat()
            })
            .collect();

        assert_eq!(
            proposals,
            vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0], vec![0.0, -1.0]]
        );
        assert!((s.step() - 0.5).abs() < 1e-12);
        assert!(!s.settled());
    }

    #[test]
    fn annealing_accepts_improvements_and_cools() {
        let mut s = AnnealingPerturbation::new(0.1, 1.0, 0.5);
        let mut rng = ONDRng::new(b"an");
        assert!(s.accept(-1.0, 0.0, &mut rng));
        assert!((s.temperature() - 0.5).abs() < 1e-12);

        let c = s.propose(&pv(1.0, 1.0), &History::new(), &mut rng);
        assert!(c.to_flat().iter().all(|v| (v - 1.0).abs() <= 0.1));
    }

    #[test]
    fn top_distinct_skips_repeats() {
        let mut h = History::new();
        for (i, (g, e)) in [(0.1, 3.0), (0.2, 1.0), (0.2, 0.5), (0.3, 2.0)].iter().enumerate() {
            h.push(Trial {
                iteration: i,
                params: pv(*g, 0.0),
                energy: *e,
                accepted: true,
            });
        }
        let top: Vec<f64> = h.top_distinct(2).iter().map(|t| t.energy).collect();
        assert_eq!(top, vec![0.5, 2.0]);
        assert_eq!(h.best().unwrap().energy, 0.5);
    }
}
