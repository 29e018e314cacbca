use crate::bitstring::Bitstring;
use crate::error::QuboError;
use crate::model::{QuboBuilder, QuboModel};
use crate::Objective;
use serde::{Deserialize, Serialize};

/// Edge as it appears in an instance file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeSpec {
    pub u: usize,
    pub v: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MaxCutSpec {
    pub nodes: usize,
    /// When set, every edge must carry an explicit weight.
    #[serde(default)]
    pub weighted: bool,
    pub edges: Vec<EdgeSpec>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaxCut {
    nodes: usize,
    edges: Vec<Edge>,
}

/// Two-sided vertex partition. Vertices with bit 0 are on the left.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Partition {
    pub assignment: Bitstring,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub cut_value: f64,
}

impl MaxCut {
    pub fn new(nodes: usize, edges: Vec<Edge>) -> Result<Self, QuboError> {
        if nodes == 0 {
            return Err(QuboError::shape("graph node count", 1, 0));
        }
        for e in &edges {
            if e.u >= nodes || e.v >= nodes {
                return Err(QuboError::instance(format!(
                    "edge ({}, {}) references a node outside 0..{}",
                    e.u, e.v, nodes
                )));
            }
            if e.u == e.v {
                return Err(QuboError::instance(format!("self loop on node {}", e.u)));
            }
            if !e.weight.is_finite() {
                return Err(QuboError::NonFinite(format!("weight of edge ({}, {})", e.u, e.v)));
            }
        }
        Ok(Self { nodes, edges })
    }

    pub fn unweighted(nodes: usize, edges: &[(usize, usize)]) -> Result<Self, QuboError> {
        let edges = edges
            .iter()
            .map(|&(u, v)| Edge { u, v, weight: 1.0 })
            .collect();
        Self::new(nodes, edges)
    }

    pub fn from_spec(spec: MaxCutSpec) -> Result<Self, QuboError> {
        let mut edges = Vec::with_capacity(spec.edges.len());
        for e in spec.edges {
            let weight = match (spec.weighted, e.weight) {
                (true, Some(w)) => w,
                (true, None) => return Err(QuboError::MissingWeight { u: e.u, v: e.v }),
                (false, None) => 1.0,
                (false, Some(_)) => {
                    return Err(QuboError::instance(format!(
                        "edge ({}, {}) carries a weight but the instance is unweighted",
                        e.u, e.v
                    )))
                }
            };
            edges.push(Edge { u: e.u, v: e.v, weight });
        }
        Self::new(spec.nodes, edges)
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn mean_degree(&self) -> f64 {
        2.0 * self.edges.len() as f64 / self.nodes as f64
    }

    /// `C(x) = -cut(x)`: each edge adds `-w x_u - w x_v + 2w x_u x_v`.
    pub fn to_qubo(&self) -> Result<QuboModel, QuboError> {
        let mut b = QuboBuilder::new(self.nodes);
        for e in &self.edges {
            b.add_linear(e.u, -e.weight)
                .add_linear(e.v, -e.weight)
                .add_quadratic(e.u, e.v, 2.0 * e.weight);
        }
        b.build()
    }

    /// `sum w_uv [x_u != x_v]`.
    pub fn cut_value(&self, bits: &Bitstring) -> Result<f64, QuboError> {
        bits.expect_len(self.nodes, "cut assignment")?;
        Ok(self
            .edges
            .iter()
            .filter(|e| bits.get(e.u) != bits.get(e.v))
            .map(|e| e.weight)
            .sum())
    }

    pub fn decode(&self, bits: &Bitstring) -> Result<Partition, QuboError> {
        let cut_value = self.cut_value(bits)?;
        let (right, left): (Vec<usize>, Vec<usize>) = (0..self.nodes).partition(|&i| bits.get(i));
        Ok(Partition {
            assignment: bits.clone(),
            left,
            right,
            cut_value,
        })
    }
}

impl Objective for MaxCut {
    fn num_vars(&self) -> usize {
        self.nodes
    }

    fn cost(&self, bits: &Bitstring) -> Result<f64, QuboError> {
        Ok(-self.cut_value(bits)?)
    }
}
