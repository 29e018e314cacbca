use crate::error::OptimizerError;
use crate::evaluator::EvalTag;
use crate::params::ParameterVector;
use crate::strategy::{History, StepStrategy, Trial};
use log::{debug, error, info};
use qubo::QuboError;
use rng::ONDRng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Initialized,
    Running,
    Converged,
    MaxIterReached,
    Cancelled,
    Failed,
}

/// How a finished run ended. Failure is reported as an error instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Converged,
    MaxIterReached,
    Cancelled,
}

impl From<RunStatus> for LoopState {
    fn from(s: RunStatus) -> Self {
        match s {
            RunStatus::Converged => LoopState::Converged,
            RunStatus::MaxIterReached => LoopState::MaxIterReached,
            RunStatus::Cancelled => LoopState::Cancelled,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopConfig {
    pub max_iterations: usize,
    /// Best-energy improvements at or below this count as stagnation.
    pub tolerance: f64,
    /// Consecutive stagnant iterations before declaring convergence; 0 disables.
    pub patience: usize,
    /// Distinct low-energy candidates re-checked after the loop.
    pub verify_top: usize,
    /// Fresh evaluations per re-checked candidate; 0 trusts recorded energies.
    pub verify_repeats: usize,
    /// Seed for the strategy's own random choices.
    pub seed: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            patience: 25,
            verify_top: 3,
            verify_repeats: 3,
            seed: "qaoa".into(),
        }
    }
}

/// Cooperative cancellation flag, checked once per iteration.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub status: RunStatus,
    pub best_params: ParameterVector,
    /// Mean re-evaluated energy of `best_params`.
    pub best_energy: f64,
    /// Lowest single evaluation seen during the loop.
    pub best_observed_energy: f64,
    pub iterations: usize,
    pub evaluations: u64,
    /// Best-observed energy after each iteration; never increases.
    pub best_trace: Vec<f64>,
}

pub struct OptimizerLoop<S: StepStrategy> {
    config: LoopConfig,
    strategy: S,
    stop: Option<StopSignal>,
    state: LoopState,
    history: History,
}

impl<S: StepStrategy> OptimizerLoop<S> {
    pub fn new(config: LoopConfig, strategy: S) -> Self {
        Self {
            config,
            strategy,
            stop: None,
            state: LoopState::Initialized,
            history: History::new(),
        }
    }

    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop = Some(signal);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Minimize `evaluate` starting from `initial`.
    ///
    /// `evaluate` receives a fresh `EvalTag` on every call so a stochastic
    /// evaluator can derive independent, reproducible sample streams.
    pub fn run<F>(&mut self, initial: ParameterVector, mut evaluate: F) -> Result<OptimizationResult, OptimizerError>
    where
        F: FnMut(&ParameterVector, EvalTag) -> Result<f64, QuboError>,
    {
        if self.state != LoopState::Initialized {
            return Err(OptimizerError::InvalidConfig(format!(
                "loop already used (state {:?})",
                self.state
            )));
        }
        self.state = LoopState::Running;
        info!(
            "optimizer start: strategy={} depth={} max_iterations={}",
            self.strategy.name(),
            initial.depth(),
            self.config.max_iterations
        );

        let mut rng = ONDRng::from_label(&format!("{}-strategy", self.config.seed));
        let mut tag: EvalTag = 0;

        let e0 = self.checked_eval(&mut evaluate, &initial, &mut tag, 0)?;
        self.history.push(Trial {
            iteration: 0,
            params: initial.clone(),
            energy: e0,
            accepted: true,
        });

        let mut current = initial;
        let mut current_energy = e0;
        let mut best_energy = e0;
        let mut best_trace = vec![e0];
        let mut stagnant = 0usize;
        let mut iterations = 0usize;

        let status = loop {
            if self.stop.as_ref().is_some_and(StopSignal::is_stopped) {
                info!("optimizer stopped externally after {} iterations", iterations);
                break RunStatus::Cancelled;
            }
            if iterations >= self.config.max_iterations {
                break RunStatus::MaxIterReached;
            }
            iterations += 1;

            let candidate = self.strategy.propose(&current, &self.history, &mut rng);
            let e = self.checked_eval(&mut evaluate, &candidate, &mut tag, iterations)?;
            let accepted = self.strategy.accept(e, current_energy, &mut rng);
            debug!(
                "iteration {}: energy={:.6} accepted={} params={:?}",
                iterations,
                e,
                accepted,
                candidate.to_flat()
            );

            self.history.push(Trial {
                iteration: iterations,
                params: candidate.clone(),
                energy: e,
                accepted,
            });
            if accepted {
                current = candidate;
                current_energy = e;
            }

            if e < best_energy - self.config.tolerance {
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            if e < best_energy {
                best_energy = e;
            }
            best_trace.push(best_energy);

            if self.config.patience > 0 && stagnant >= self.config.patience {
                info!("optimizer converged: no improvement for {} iterations", stagnant);
                break RunStatus::Converged;
            }
            if self.strategy.settled() {
                info!("optimizer converged: strategy settled");
                break RunStatus::Converged;
            }
        };

        let (best_params, verified) = self.verify(&mut evaluate, &mut tag, iterations)?;
        self.state = status.into();
        info!(
            "optimizer finished: status={:?} iterations={} best={:.6} verified={:.6}",
            status, iterations, best_energy, verified
        );

        Ok(OptimizationResult {
            status,
            best_params,
            best_energy: verified,
            best_observed_energy: best_energy,
            iterations,
            evaluations: tag,
            best_trace,
        })
    }

    /// Re-evaluate the lowest-energy candidates so a lucky sample cannot
    /// pass as the optimum.
    fn verify<F>(
        &mut self,
        evaluate: &mut F,
        tag: &mut EvalTag,
        iteration: usize,
    ) -> Result<(ParameterVector, f64), OptimizerError>
    where
        F: FnMut(&ParameterVector, EvalTag) -> Result<f64, QuboError>,
    {
        let top: Vec<Trial> = self
            .history
            .top_distinct(self.config.verify_top.max(1))
            .into_iter()
            .cloned()
            .collect();

        let mut best: Option<(ParameterVector, f64)> = None;
        for trial in top {
            let mean = if self.config.verify_repeats == 0 {
                trial.energy
            } else {
                let mut sum = 0.0;
                for _ in 0..self.config.verify_repeats {
                    sum += self.checked_eval(evaluate, &trial.params, tag, iteration)?;
                }
                sum / self.config.verify_repeats as f64
            };
            debug!(
                "verify: recorded={:.6} re-evaluated={:.6} params={:?}",
                trial.energy,
                mean,
                trial.params.to_flat()
            );
            if best.as_ref().map_or(true, |(_, b)| mean < *b) {
                best = Some((trial.params, mean));
            }
        }

        best.ok_or_else(|| OptimizerError::InvalidConfig("no candidates to verify".into()))
    }

    fn checked_eval<F>(
        &mut self,
        evaluate: &mut F,
        params: &ParameterVector,
        tag: &mut EvalTag,
        iteration: usize,
    ) -> Result<f64, OptimizerError>
    where
        F: FnMut(&ParameterVector, EvalTag) -> Result<f64, QuboError>,
    {
        let this_tag = *tag;
        *tag += 1;
        let e = match evaluate(params, this_tag) {
            Ok(e) => e,
            Err(err) => {
                self.state = LoopState::Failed;
                return Err(err.into());
            }
        };
        if !e.is_finite() {
            self.state = LoopState::Failed;
            error!("optimizer diverged at iteration {}: energy = {}", iteration, e);
            return Err(OptimizerError::Diverged { iteration, energy: e });
        }
        Ok(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::PatternSearch;

    #[test]
    fn second_run_on_same_loop_is_rejected() {
        let mut opt = OptimizerLoop::new(
            LoopConfig {
                max_iterations: 2,
                ..LoopConfig::default()
            },
            PatternSearch::default(),
        );
        let x0 = ParameterVector::new(vec![0.0], vec![0.0]).unwrap();
        opt.run(x0.clone(), |p, _| Ok(p.to_flat().iter().map(|v| v * v).sum()))
            .unwrap();
        assert!(matches!(
            opt.run(x0, |_, _| Ok(0.0)),
            Err(OptimizerError::InvalidConfig(_))
        ));
    }
}
