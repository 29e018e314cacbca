use qubo::problems::maxcut::{MaxCut, MaxCutSpec};
use qubo::problems::Problem;
use qubo::{enumerate, Bitstring, IsingModel, QuboError};

fn c4() -> MaxCut {
    MaxCut::unweighted(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
}

#[test]
fn c4_optimal_cut_is_four() {
    let g = c4();
    let qubo = g.to_qubo().unwrap();

    let mut best = f64::INFINITY;
    let mut argmin = Vec::new();
    for x in enumerate(4).unwrap() {
        let c = qubo.evaluate(&x).unwrap();
        assert!((c + g.cut_value(&x).unwrap()).abs() < 1e-12, "x = {}", x);
        if c < best - 1e-12 {
            best = c;
            argmin = vec![x];
        } else if (c - best).abs() < 1e-12 {
            argmin.push(x);
        }
    }

    assert!((best + 4.0).abs() < 1e-12);
    let names: Vec<String> = argmin.iter().map(|b| b.to_string()).collect();
    assert_eq!(names, vec!["0101", "1010"]);
}

#[test]
fn c4_ising_ground_state() {
    let g = c4();
    let ising = IsingModel::from_qubo(&g.to_qubo().unwrap());
    let x: Bitstring = "0101".parse().unwrap();
    assert!((ising.energy_bits(&x).unwrap() + 4.0).abs() < 1e-12);
    // Max-Cut has no local fields after conversion.
    assert!(ising.fields().iter().all(|h| h.abs() < 1e-12));
    assert!((ising.mean_degree() - 2.0).abs() < 1e-12);
}

#[test]
fn decode_partition_is_stable() {
    let g = c4();
    let x: Bitstring = "1010".parse().unwrap();
    let a = g.decode(&x).unwrap();
    let b = g.decode(&x).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.left, vec![1, 3]);
    assert_eq!(a.right, vec![0, 2]);
    assert!((a.cut_value - 4.0).abs() < 1e-12);
}

#[test]
fn weighted_instance_requires_weights() {
    let json = r#"{"kind":"maxcut","nodes":3,"weighted":true,
                   "edges":[{"u":0,"v":1,"weight":2.0},{"u":1,"v":2}]}"#;
    match Problem::from_json(json) {
        Err(QuboError::MissingWeight { u, v }) => assert_eq!((u, v), (1, 2)),
        other => panic!("expected MissingWeight, got {:?}", other),
    }
}

#[test]
fn weighted_cut_value() {
    let spec: MaxCutSpec = serde_json::from_str(
        r#"{"nodes":3,"weighted":true,"edges":[{"u":0,"v":1,"weight":2.5},{"u":1,"v":2,"weight":-1.0}]}"#,
    )
    .unwrap();
    let g = MaxCut::from_spec(spec).unwrap();
    let x: Bitstring = "010".parse().unwrap();
    assert!((g.cut_value(&x).unwrap() - 1.5).abs() < 1e-12);
}

#[test]
fn rejects_bad_edges() {
    assert!(MaxCut::unweighted(2, &[(0, 2)]).is_err());
    assert!(MaxCut::unweighted(2, &[(1, 1)]).is_err());
    assert!(matches!(
        MaxCut::unweighted(0, &[]),
        Err(QuboError::InvalidShape { .. })
    ));
    let json = r#"{"kind":"maxcut","nodes":2,"edges":[{"u":0,"v":1,"weight":3.0}]}"#;
    assert!(matches!(
        Problem::from_json(json),
        Err(QuboError::InvalidInstance(_))
    ));
}
