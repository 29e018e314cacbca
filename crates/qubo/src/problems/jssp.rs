use crate::bitstring::Bitstring;
use crate::error::QuboError;
use crate::model::{QuboBuilder, QuboModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OperationSpec {
    pub machine: String,
    pub duration: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JsspSpec {
    /// Number of start slots `T`; operation starts range over `0..T`.
    pub horizon: usize,
    /// Operations of each job, in processing order.
    pub jobs: Vec<Vec<OperationSpec>>,
    #[serde(default)]
    pub penalties: JsspPenalties,
}

/// Weights of the constraint penalties and the late-finish objective.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JsspPenalties {
    pub one_hot: f64,
    pub machine: f64,
    pub precedence: f64,
    pub makespan: f64,
}

impl Default for JsspPenalties {
    fn default() -> Self {
        Self {
            one_hot: 10.0,
            machine: 10.0,
            precedence: 10.0,
            makespan: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub job: usize,
    /// Position within its job.
    pub position: usize,
    pub machine: String,
    pub duration: usize,
}

/// Job-shop instance with a time-indexed binary encoding: variable
/// `k * T + t` is set when operation `k` starts at slot `t`.
#[derive(Clone, Debug, PartialEq)]
pub struct Jssp {
    operations: Vec<Operation>,
    horizon: usize,
    penalties: JsspPenalties,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub operation: usize,
    pub job: usize,
    pub position: usize,
    pub machine: String,
    pub start: usize,
    pub duration: usize,
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Sorted by start slot, then operation index.
    pub entries: Vec<ScheduleEntry>,
    pub makespan: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Operation asserted zero or several start slots.
    UniqueStart {
        operation: usize,
        job: usize,
        position: usize,
        count: usize,
    },
    MachineOverlap {
        machine: String,
        first: usize,
        second: usize,
    },
    Precedence {
        job: usize,
        before: usize,
        after: usize,
        before_end: usize,
        after_start: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UniqueStart {
                operation, count, ..
            } => write!(f, "operation {} has {} start slots", operation, count),
            Violation::MachineOverlap {
                machine,
                first,
                second,
            } => write!(
                f,
                "operations {} and {} overlap on machine {}",
                first, second, machine
            ),
            Violation::Precedence {
                job,
                before,
                after,
                before_end,
                after_start,
            } => write!(
                f,
                "job {}: operation {} starts at {} before operation {} ends at {}",
                job, after, after_start, before, before_end
            ),
        }
    }
}

/// Every hard-constraint violation found in a decoded assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeasibilityReport {
    pub violations: Vec<Violation>,
    /// Operations that did decode to a unique start.
    pub partial: Vec<ScheduleEntry>,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn unique_start(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::UniqueStart { .. }))
    }

    pub fn machine_overlaps(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::MachineOverlap { .. }))
    }

    pub fn precedence(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::Precedence { .. }))
    }
}

impl fmt::Display for FeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for (i, v) in self.violations.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { ": " } else { "; " }, v)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleDecode {
    Feasible(Schedule),
    Infeasible(FeasibilityReport),
}

impl ScheduleDecode {
    pub fn is_feasible(&self) -> bool {
        matches!(self, ScheduleDecode::Feasible(_))
    }

    pub fn into_result(self) -> Result<Schedule, QuboError> {
        match self {
            ScheduleDecode::Feasible(s) => Ok(s),
            ScheduleDecode::Infeasible(r) => Err(QuboError::InfeasibleDecode(r)),
        }
    }
}

impl Jssp {
    pub fn new(
        jobs: Vec<Vec<(String, usize)>>,
        horizon: usize,
        penalties: JsspPenalties,
    ) -> Result<Self, QuboError> {
        if horizon == 0 {
            return Err(QuboError::shape("scheduling horizon", 1, 0));
        }
        for (name, v) in [
            ("one_hot", penalties.one_hot),
            ("machine", penalties.machine),
            ("precedence", penalties.precedence),
            ("makespan", penalties.makespan),
        ] {
            if !v.is_finite() {
                return Err(QuboError::NonFinite(format!("penalty {}", name)));
            }
        }

        let mut operations = Vec::new();
        for (job, ops) in jobs.into_iter().enumerate() {
            for (position, (machine, duration)) in ops.into_iter().enumerate() {
                if duration == 0 {
                    return Err(QuboError::instance(format!(
                        "job {} operation {} has zero duration",
                        job, position
                    )));
                }
                operations.push(Operation {
                    job,
                    position,
                    machine,
                    duration,
                });
            }
        }
        if operations.is_empty() {
            return Err(QuboError::instance("instance has no operations"));
        }

        Ok(Self {
            operations,
            horizon,
            penalties,
        })
    }

    pub fn from_spec(spec: JsspSpec) -> Result<Self, QuboError> {
        let jobs = spec
            .jobs
            .into_iter()
            .map(|ops| ops.into_iter().map(|o| (o.machine, o.duration)).collect())
            .collect();
        Self::new(jobs, spec.horizon, spec.penalties)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn penalties(&self) -> JsspPenalties {
        self.penalties
    }

    pub fn num_vars(&self) -> usize {
        self.operations.len() * self.horizon
    }

    pub fn var_index(&self, op: usize, t: usize) -> usize {
        op * self.horizon + t
    }

    /// Mean number of nonzero pair terms per variable in the QUBO.
    pub fn mean_degree(&self) -> Result<f64, QuboError> {
        let qubo = self.to_qubo()?;
        let n = qubo.n();
        let mut pairs = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                if qubo.pair_coefficient(i, j) != 0.0 {
                    pairs += 1;
                }
            }
        }
        Ok(2.0 * pairs as f64 / n as f64)
    }

    pub fn to_qubo(&self) -> Result<QuboModel, QuboError> {
        let t_max = self.horizon;
        let p = self.penalties;
        let mut b = QuboBuilder::new(self.num_vars());

        // P (sum_t x_kt - 1)^2 = P - P sum_t x_kt + 2P sum_{t1<t2} x_kt1 x_kt2
        for k in 0..self.operations.len() {
            b.add_offset(p.one_hot);
            for t1 in 0..t_max {
                b.add_linear(self.var_index(k, t1), -p.one_hot);
                for t2 in (t1 + 1)..t_max {
                    b.add_quadratic(self.var_index(k, t1), self.var_index(k, t2), 2.0 * p.one_hot);
                }
            }
        }

        // k2 may not start while k1 runs on the same machine. Ordered pairs,
        // so a shared start slot is charged from both sides.
        for (k1, o1) in self.operations.iter().enumerate() {
            for (k2, o2) in self.operations.iter().enumerate() {
                if k1 == k2 || o1.machine != o2.machine {
                    continue;
                }
                for t1 in 0..t_max {
                    for t2 in t1..(t1 + o1.duration).min(t_max) {
                        b.add_quadratic(self.var_index(k1, t1), self.var_index(k2, t2), p.machine);
                    }
                }
            }
        }

        // Next operation of a job may not start before the previous one ends.
        for (k1, k2) in self.consecutive_pairs() {
            let d1 = self.operations[k1].duration;
            for t1 in 0..t_max {
                for t2 in 0..(t1 + d1).min(t_max) {
                    b.add_quadratic(self.var_index(k1, t1), self.var_index(k2, t2), p.precedence);
                }
            }
        }

        // Late-finish objective.
        for (k, op) in self.operations.iter().enumerate() {
            for t in 0..t_max {
                b.add_linear(self.var_index(k, t), p.makespan * (t + op.duration) as f64);
            }
        }

        b.build()
    }

    fn consecutive_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for k in 1..self.operations.len() {
            if self.operations[k].job == self.operations[k - 1].job {
                pairs.push((k - 1, k));
            }
        }
        pairs
    }

    /// Read one start slot per operation and check every hard constraint.
    /// Operations with zero or several asserted slots are reported, never
    /// guessed; remaining checks run over operations with a unique start.
    pub fn decode(&self, bits: &Bitstring) -> Result<ScheduleDecode, QuboError> {
        bits.expect_len(self.num_vars(), "schedule assignment")?;

        let mut violations = Vec::new();
        let mut starts: Vec<Option<usize>> = Vec::with_capacity(self.operations.len());
        for (k, op) in self.operations.iter().enumerate() {
            let asserted: Vec<usize> = (0..self.horizon)
                .filter(|&t| bits.get(self.var_index(k, t)))
                .collect();
            if asserted.len() == 1 {
                starts.push(Some(asserted[0]));
            } else {
                starts.push(None);
                violations.push(Violation::UniqueStart {
                    operation: k,
                    job: op.job,
                    position: op.position,
                    count: asserted.len(),
                });
            }
        }

        let entries: Vec<ScheduleEntry> = self
            .operations
            .iter()
            .enumerate()
            .filter_map(|(k, op)| {
                starts[k].map(|start| ScheduleEntry {
                    operation: k,
                    job: op.job,
                    position: op.position,
                    machine: op.machine.clone(),
                    start,
                    duration: op.duration,
                    end: start + op.duration,
                })
            })
            .collect();

        violations.extend(machine_overlaps(&entries));

        for (k1, k2) in self.consecutive_pairs() {
            if let (Some(s1), Some(s2)) = (starts[k1], starts[k2]) {
                let end1 = s1 + self.operations[k1].duration;
                if s2 < end1 {
                    violations.push(Violation::Precedence {
                        job: self.operations[k1].job,
                        before: k1,
                        after: k2,
                        before_end: end1,
                        after_start: s2,
                    });
                }
            }
        }

        let mut entries = entries;
        entries.sort_by_key(|e| (e.start, e.operation));

        if !violations.is_empty() {
            log::debug!("infeasible schedule for {}: {} violation(s)", bits, violations.len());
            return Ok(ScheduleDecode::Infeasible(FeasibilityReport {
                violations,
                partial: entries,
            }));
        }

        let makespan = entries.iter().map(|e| e.end).max().unwrap_or(0);
        Ok(ScheduleDecode::Feasible(Schedule { entries, makespan }))
    }
}

fn machine_overlaps(entries: &[ScheduleEntry]) -> Vec<Violation> {
    let mut by_machine: BTreeMap<&str, Vec<&ScheduleEntry>> = BTreeMap::new();
    for e in entries {
        by_machine.entry(e.machine.as_str()).or_default().push(e);
    }

    let mut out = Vec::new();
    for (machine, ops) in by_machine {
        for (i, a) in ops.iter().enumerate() {
            for b in &ops[i + 1..] {
                if a.start < b.end && b.start < a.end {
                    out.push(Violation::MachineOverlap {
                        machine: machine.to_string(),
                        first: a.operation.min(b.operation),
                        second: a.operation.max(b.operation),
                    });
                }
            }
        }
    }
    out
}
