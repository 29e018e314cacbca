use crate::error::OptimizerError;
use crate::evaluator::Evaluator;
use crate::optimizer::{LoopConfig, OptimizerLoop, RunStatus, StopSignal};
use crate::params::ParameterVector;
use crate::sampler::{AnnealingSampler, SamplerConfig};
use crate::strategy::{AnnealingPerturbation, PatternSearch, StepStrategy};
use log::info;
use qubo::problems::{Problem, Solution};
use qubo::{Bitstring, IsingModel};
use rng::ONDRng;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Pattern,
    Anneal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitKind {
    /// `beta = pi/4`, `gamma = pi / (4 * mean degree)`.
    Warm,
    Random,
}

#[derive(Clone, Debug)]
pub struct SolveConfig {
    pub depth: usize,
    pub shots: usize,
    pub strategy: StrategyKind,
    pub init: InitKind,
    pub sampler: SamplerConfig,
    pub loop_config: LoopConfig,
    /// Root seed; sampling, initialization and strategy streams derive from it.
    pub seed: String,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            shots: 256,
            strategy: StrategyKind::Pattern,
            init: InitKind::Warm,
            sampler: SamplerConfig::default(),
            loop_config: LoopConfig::default(),
            seed: "qaoa".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolveReport {
    pub problem: &'static str,
    pub status: RunStatus,
    pub iterations: usize,
    pub evaluations: u64,
    pub params: ParameterVector,
    /// Verified expectation at `params`.
    pub energy: f64,
    pub best_bitstring: Bitstring,
    pub best_cost: f64,
    pub best_trace: Vec<f64>,
    pub solution: Solution,
}

/// Instance -> QUBO -> Ising -> optimized parameters -> decoded solution.
pub fn solve(problem: &Problem, config: &SolveConfig, stop: Option<StopSignal>) -> Result<SolveReport, OptimizerError> {
    let qubo = problem.to_qubo()?;
    let ising = IsingModel::from_qubo(&qubo);
    info!(
        "solving {}: {} variables, {} couplings, depth {}",
        problem.name(),
        ising.n(),
        ising.num_couplings(),
        config.depth
    );

    let initial = match config.init {
        InitKind::Warm => ParameterVector::warm_start(config.depth, problem.mean_degree()?)?,
        InitKind::Random => {
            let mut rng = ONDRng::from_label(&format!("{}-init", config.seed));
            ParameterVector::random(config.depth, &mut rng)?
        }
    };

    let evaluator = Evaluator::new(
        ising,
        AnnealingSampler::new(config.sampler),
        config.shots,
        format!("{}-sample", config.seed),
    )?;

    let loop_config = LoopConfig {
        seed: format!("{}-{}", config.seed, config.loop_config.seed),
        ..config.loop_config.clone()
    };
    let strategy: Box<dyn StepStrategy> = match config.strategy {
        StrategyKind::Pattern => Box::new(PatternSearch::default()),
        StrategyKind::Anneal => Box::new(AnnealingPerturbation::default()),
    };
    let mut opt = OptimizerLoop::new(loop_config, strategy);
    if let Some(signal) = stop {
        opt = opt.with_stop_signal(signal);
    }

    let result = opt.run(initial, |params, tag| {
        evaluator.evaluate(params, tag).map(|r| r.energy)
    })?;

    // One more sampled pass at the winning parameters picks the bitstring.
    let final_eval = evaluator.evaluate_with_histogram(&result.best_params, result.evaluations)?;
    let (best_bitstring, best_cost) = final_eval.best.ok_or(qubo::QuboError::EmptySample)?;
    let solution = problem.decode(&best_bitstring)?;
    info!(
        "best bitstring {} (cost {:.6}), feasible = {}",
        best_bitstring,
        best_cost,
        solution.is_feasible()
    );

    Ok(SolveReport {
        problem: problem.name(),
        status: result.status,
        iterations: result.iterations,
        evaluations: result.evaluations + 1,
        params: result.best_params,
        energy: result.best_energy,
        best_bitstring,
        best_cost,
        best_trace: result.best_trace,
        solution,
    })
}
