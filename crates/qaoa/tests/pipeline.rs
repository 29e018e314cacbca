use qaoa::{solve, InitKind, LoopConfig, SolveConfig, StrategyKind};
use qubo::problems::jssp::ScheduleDecode;
use qubo::problems::{Problem, Solution};

fn c4() -> Problem {
    Problem::from_json(
        r#"{"kind":"maxcut","nodes":4,"edges":[
            {"u":0,"v":1},{"u":1,"v":2},{"u":2,"v":3},{"u":3,"v":0}]}"#,
    )
    .unwrap()
}

fn quick(seed: &str, strategy: StrategyKind) -> SolveConfig {
    SolveConfig {
        shots: 128,
        strategy,
        loop_config: LoopConfig {
            max_iterations: 20,
            verify_repeats: 1,
            ..LoopConfig::default()
        },
        seed: seed.into(),
        ..SolveConfig::default()
    }
}

#[test]
fn c4_maxcut_finds_the_alternating_cut() {
    let report = solve(&c4(), &quick("c4", StrategyKind::Pattern), None).unwrap();

    let Solution::MaxCut(partition) = &report.solution else {
        panic!("expected a partition");
    };
    assert!((partition.cut_value - 4.0).abs() < 1e-12);
    assert!(["0101", "1010"].contains(&report.best_bitstring.to_string().as_str()));
    assert!((report.best_cost + 4.0).abs() < 1e-12);
}

#[test]
fn identical_seeds_give_identical_reports() {
    for strategy in [StrategyKind::Pattern, StrategyKind::Anneal] {
        let a = solve(&c4(), &quick("repeat", strategy), None).unwrap();
        let b = solve(&c4(), &quick("repeat", strategy), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

#[test]
fn random_init_is_reproducible() {
    let config = SolveConfig {
        init: InitKind::Random,
        depth: 2,
        ..quick("random", StrategyKind::Anneal)
    };
    let a = solve(&c4(), &config, None).unwrap();
    let b = solve(&c4(), &config, None).unwrap();
    assert_eq!(a.params, b.params);
    assert_eq!(a.params.depth(), 2);
}

#[test]
fn jssp_pipeline_decodes_a_schedule() {
    let problem = Problem::from_json(
        r#"{"kind":"jssp","horizon":3,
            "jobs":[[{"machine":"A","duration":1},{"machine":"B","duration":1}]]}"#,
    )
    .unwrap();
    let config = SolveConfig {
        shots: 1024,
        ..quick("jssp", StrategyKind::Pattern)
    };
    let report = solve(&problem, &config, None).unwrap();

    assert_eq!(report.best_bitstring.len(), 6);
    match &report.solution {
        Solution::Jssp(ScheduleDecode::Feasible(s)) => assert_eq!(s.makespan, 2),
        other => panic!("expected the optimal feasible schedule, got {:?}", other),
    }
    assert!((report.best_cost - 3.0).abs() < 1e-9);
}
