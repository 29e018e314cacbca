use crate::error::QuboError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest register that `enumerate` will walk exhaustively.
pub const MAX_ENUMERATE: usize = 24;

/// One binary decision per variable. Position 0 is printed leftmost and
/// compares first, so `Ord` is plain lexicographic order on the printed form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Bitstring(Vec<bool>);

impl Bitstring {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn zeros(n: usize) -> Self {
        Self(vec![false; n])
    }

    /// Bits of `value`, most significant first, padded to `n` positions.
    pub fn from_index(value: u64, n: usize) -> Self {
        Self((0..n).map(|i| (value >> (n - 1 - i)) & 1 == 1).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> bool {
        self.0[i]
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn to_spins(&self) -> SpinString {
        SpinString(self.0.iter().map(|&b| if b { -1 } else { 1 }).collect())
    }

    pub(crate) fn expect_len(&self, n: usize, context: &'static str) -> Result<(), QuboError> {
        if self.len() != n {
            return Err(QuboError::shape(context, n, self.len()));
        }
        Ok(())
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Bitstring {
    type Err = QuboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(QuboError::instance(format!(
                    "bitstring contains '{}', expected only 0 and 1",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Bitstring> for String {
    fn from(b: Bitstring) -> Self {
        b.to_string()
    }
}

impl TryFrom<String> for Bitstring {
    type Error = QuboError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Spin values in {-1, +1}, related to bits by `sigma = 1 - 2x`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpinString(Vec<i8>);

impl SpinString {
    pub fn new(spins: Vec<i8>) -> Result<Self, QuboError> {
        if let Some(bad) = spins.iter().find(|&&s| s != 1 && s != -1) {
            return Err(QuboError::instance(format!("spin value {} is not +1 or -1", bad)));
        }
        Ok(Self(spins))
    }

    /// Caller guarantees every entry is +1 or -1.
    pub(crate) fn from_raw(spins: Vec<i8>) -> Self {
        Self(spins)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.0
    }

    pub fn to_bitstring(&self) -> Bitstring {
        Bitstring(self.0.iter().map(|&s| s < 0).collect())
    }
}

impl From<&Bitstring> for SpinString {
    fn from(b: &Bitstring) -> Self {
        b.to_spins()
    }
}

/// All `2^n` bitstrings in lexicographic order.
pub fn enumerate(n: usize) -> Result<impl Iterator<Item = Bitstring>, QuboError> {
    if n == 0 {
        return Err(QuboError::shape("enumerated register", 1, 0));
    }
    if n > MAX_ENUMERATE {
        return Err(QuboError::shape("enumerated register", MAX_ENUMERATE, n));
    }
    Ok((0..(1u64 << n)).map(move |v| Bitstring::from_index(v, n)))
}
