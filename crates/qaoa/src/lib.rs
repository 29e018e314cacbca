pub mod error;
pub mod evaluator;
pub mod optimizer;
pub mod params;
pub mod pipeline;
pub mod sampler;
pub mod strategy;

pub use error::OptimizerError;
pub use evaluator::{EvalTag, Evaluator};
pub use optimizer::{LoopConfig, LoopState, OptimizationResult, OptimizerLoop, RunStatus, StopSignal};
pub use params::ParameterVector;
pub use pipeline::{solve, InitKind, SolveConfig, SolveReport, StrategyKind};
pub use sampler::{AnnealingSampler, Sampler, SamplerConfig};
pub use strategy::{AnnealingPerturbation, History, PatternSearch, StepStrategy, Trial};
