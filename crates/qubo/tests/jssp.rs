use qubo::problems::jssp::{Jssp, JsspPenalties, ScheduleDecode, Violation};
use qubo::problems::{Problem, Solution};
use qubo::{enumerate, Bitstring, QuboError};

/// One job, two unit operations on machines A then B, horizon 3.
fn two_step() -> Jssp {
    Jssp::new(
        vec![vec![("A".to_string(), 1), ("B".to_string(), 1)]],
        3,
        JsspPenalties::default(),
    )
    .unwrap()
}

fn bits(j: &Jssp, starts: &[&[usize]]) -> Bitstring {
    let mut v = vec![false; j.num_vars()];
    for (op, ts) in starts.iter().enumerate() {
        for &t in ts.iter() {
            v[j.var_index(op, t)] = true;
        }
    }
    Bitstring::new(v)
}

#[test]
fn both_at_zero_is_infeasible() {
    let j = two_step();
    let x = bits(&j, &[&[0], &[0]]);
    match j.decode(&x).unwrap() {
        ScheduleDecode::Infeasible(report) => {
            assert_eq!(report.precedence().count(), 1);
            assert_eq!(report.unique_start().count(), 0);
            assert_eq!(report.machine_overlaps().count(), 0);
            assert_eq!(report.partial.len(), 2);
        }
        other => panic!("expected infeasible, got {:?}", other),
    }
}

#[test]
fn sequential_assignment_is_feasible() {
    let j = two_step();
    let x = bits(&j, &[&[0], &[1]]);
    let schedule = j.decode(&x).unwrap().into_result().unwrap();
    assert_eq!(schedule.makespan, 2);
    assert_eq!(schedule.entries[0].start, 0);
    assert_eq!(schedule.entries[1].start, 1);
    assert_eq!(schedule.entries[1].machine, "B");
}

#[test]
fn missing_or_double_start_is_flagged_not_guessed() {
    let j = two_step();
    let x = bits(&j, &[&[], &[0, 2]]);
    let report = match j.decode(&x).unwrap() {
        ScheduleDecode::Infeasible(r) => r,
        other => panic!("expected infeasible, got {:?}", other),
    };
    let counts: Vec<usize> = report
        .unique_start()
        .map(|v| match v {
            Violation::UniqueStart { count, .. } => *count,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(counts, vec![0, 2]);
    assert!(report.partial.is_empty());
    assert!(matches!(
        j.decode(&x).unwrap().into_result(),
        Err(QuboError::InfeasibleDecode(_))
    ));
}

#[test]
fn machine_overlap_detected() {
    let j = Jssp::new(
        vec![
            vec![("M".to_string(), 2)],
            vec![("M".to_string(), 1)],
        ],
        3,
        JsspPenalties::default(),
    )
    .unwrap();
    let x = bits(&j, &[&[0], &[1]]);
    let report = match j.decode(&x).unwrap() {
        ScheduleDecode::Infeasible(r) => r,
        other => panic!("expected infeasible, got {:?}", other),
    };
    assert_eq!(
        report.violations,
        vec![Violation::MachineOverlap {
            machine: "M".into(),
            first: 0,
            second: 1
        }]
    );

    let ok = bits(&j, &[&[0], &[2]]);
    assert!(j.decode(&ok).unwrap().is_feasible());
}

#[test]
fn decode_is_idempotent() {
    let j = two_step();
    let x = bits(&j, &[&[0], &[1]]);
    assert_eq!(j.decode(&x).unwrap(), j.decode(&x).unwrap());
}

#[test]
fn qubo_minimum_is_the_feasible_schedule() {
    let j = two_step();
    let q = j.to_qubo().unwrap();

    let mut best = (f64::INFINITY, Bitstring::zeros(0));
    for x in enumerate(q.n()).unwrap() {
        let c = q.evaluate(&x).unwrap();
        if c < best.0 {
            best = (c, x);
        }
    }

    // Late-finish objective: (0 + 1) + (1 + 1).
    assert!((best.0 - 3.0).abs() < 1e-9, "best = {}", best.0);
    assert_eq!(best.1, bits(&j, &[&[0], &[1]]));

    // Empty assignment pays the one-hot penalty for both operations.
    let empty = Bitstring::zeros(q.n());
    assert!((q.evaluate(&empty).unwrap() - 20.0).abs() < 1e-9);

    // Double start on one operation is strictly worse than a single one.
    let double = bits(&j, &[&[0, 1], &[2]]);
    let single = bits(&j, &[&[0], &[2]]);
    assert!(q.evaluate(&double).unwrap() > q.evaluate(&single).unwrap());
}

#[test]
fn loads_from_json() {
    let json = r#"{
        "kind": "jssp",
        "horizon": 3,
        "jobs": [[{"machine": "A", "duration": 1}, {"machine": "B", "duration": 1}]],
        "penalties": {"one_hot": 5.0}
    }"#;
    let p = Problem::from_json(json).unwrap();
    assert_eq!(p.num_vars(), 6);
    let Problem::Jssp(j) = &p else {
        panic!("expected a JSSP instance");
    };
    assert_eq!(j.penalties().one_hot, 5.0);
    assert_eq!(j.penalties().machine, 10.0);

    let sol = p.decode(&bits(j, &[&[0], &[1]])).unwrap();
    assert!(matches!(sol, Solution::Jssp(ScheduleDecode::Feasible(_))));
}

#[test]
fn rejects_zero_duration_and_horizon() {
    assert!(Jssp::new(vec![vec![("A".into(), 0)]], 3, JsspPenalties::default()).is_err());
    assert!(matches!(
        Jssp::new(vec![vec![("A".into(), 1)]], 0, JsspPenalties::default()),
        Err(QuboError::InvalidShape { .. })
    ));
}
