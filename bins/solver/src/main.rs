use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};

use qaoa::{solve, InitKind, LoopConfig, SolveConfig, StrategyKind};
use qubo::problems::Problem;

/// Classical QAOA driver: instance JSON in, JSON report out.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Problem instance (JSON, tagged by "kind": maxcut | jssp)
    #[arg(long)]
    instance: String,

    /// Number of QAOA layers
    #[arg(long, default_value_t = 1)]
    depth: usize,

    /// Samples per expectation estimate
    #[arg(long, default_value_t = 256)]
    shots: usize,

    /// Optimizer iteration budget
    #[arg(long, default_value_t = 200)]
    max_iter: usize,

    /// Improvements at or below this count as stagnation
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Stagnant iterations before stopping (0 = never)
    #[arg(long, default_value_t = 25)]
    patience: usize,

    /// Step strategy
    #[arg(long, value_enum, default_value_t = Strategy::Pattern)]
    strategy: Strategy,

    /// Initial parameters
    #[arg(long, value_enum, default_value_t = Init::Warm)]
    init: Init,

    /// RNG seed (full reproducibility)
    #[arg(long, default_value = "qaoa")]
    seed: String,

    /// Number of Rayon worker threads (0 = Rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Log per-iteration detail
    #[arg(long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Pattern,
    Anneal,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Init {
    Warm,
    Random,
}

fn setup_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = setup_logger(level, args.log_file.as_deref()) {
        eprintln!("failed to set up logging: {}", e);
        std::process::exit(1);
    }

    if args.threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
        {
            error!("failed to build Rayon thread pool: {}", e);
            std::process::exit(1);
        }
    }

    let problem = match Problem::load(&args.instance) {
        Ok(p) => p,
        Err(e) => {
            error!("cannot load {}: {}", args.instance, e);
            std::process::exit(1);
        }
    };

    let config = SolveConfig {
        depth: args.depth,
        shots: args.shots,
        strategy: match args.strategy {
            Strategy::Pattern => StrategyKind::Pattern,
            Strategy::Anneal => StrategyKind::Anneal,
        },
        init: match args.init {
            Init::Warm => InitKind::Warm,
            Init::Random => InitKind::Random,
        },
        loop_config: LoopConfig {
            max_iterations: args.max_iter,
            tolerance: args.tolerance,
            patience: args.patience,
            ..LoopConfig::default()
        },
        seed: args.seed.clone(),
        ..SolveConfig::default()
    };
    info!(
        "instance {} ({}), seed {:?}, threads {}",
        args.instance,
        problem.name(),
        args.seed,
        rayon::current_num_threads()
    );

    let report = match solve(&problem, &config, None) {
        Ok(r) => r,
        Err(e) => {
            error!("solve failed: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            error!("cannot serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
