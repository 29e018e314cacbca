pub mod jssp;
pub mod maxcut;

use crate::bitstring::Bitstring;
use crate::error::QuboError;
use crate::model::QuboModel;
use jssp::{Jssp, JsspSpec, ScheduleDecode};
use maxcut::{MaxCut, MaxCutSpec, Partition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Instance file contents, tagged by `"kind"`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstanceSpec {
    MaxCut(MaxCutSpec),
    Jssp(JsspSpec),
}

/// Validated problem instance.
#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    MaxCut(MaxCut),
    Jssp(Jssp),
}

/// Domain object recovered from a bitstring.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "lowercase")]
pub enum Solution {
    MaxCut(Partition),
    Jssp(ScheduleDecode),
}

impl Solution {
    pub fn is_feasible(&self) -> bool {
        match self {
            Solution::MaxCut(_) => true,
            Solution::Jssp(d) => d.is_feasible(),
        }
    }
}

impl Problem {
    pub fn from_spec(spec: InstanceSpec) -> Result<Self, QuboError> {
        match spec {
            InstanceSpec::MaxCut(s) => MaxCut::from_spec(s).map(Problem::MaxCut),
            InstanceSpec::Jssp(s) => Jssp::from_spec(s).map(Problem::Jssp),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, QuboError> {
        let spec: InstanceSpec = serde_json::from_str(text)?;
        Self::from_spec(spec)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuboError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            QuboError::instance(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Problem::MaxCut(_) => "maxcut",
            Problem::Jssp(_) => "jssp",
        }
    }

    pub fn num_vars(&self) -> usize {
        match self {
            Problem::MaxCut(g) => g.nodes(),
            Problem::Jssp(j) => j.num_vars(),
        }
    }

    pub fn to_qubo(&self) -> Result<QuboModel, QuboError> {
        match self {
            Problem::MaxCut(g) => g.to_qubo(),
            Problem::Jssp(j) => j.to_qubo(),
        }
    }

    /// Degree used by the `gamma` warm start.
    pub fn mean_degree(&self) -> Result<f64, QuboError> {
        match self {
            Problem::MaxCut(g) => Ok(g.mean_degree()),
            Problem::Jssp(j) => j.mean_degree(),
        }
    }

    pub fn decode(&self, bits: &Bitstring) -> Result<Solution, QuboError> {
        match self {
            Problem::MaxCut(g) => g.decode(bits).map(Solution::MaxCut),
            Problem::Jssp(j) => j.decode(bits).map(Solution::Jssp),
        }
    }
}
