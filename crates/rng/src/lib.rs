use sha3::{digest::{ExtendableOutput, Update, XofReader}, Shake256};

/// Deterministic stream of uniform draws derived from a seed string.
///
/// Every draw is domain-separated by a short context tag, so two consumers
/// asking for different things from the same seed never see correlated bits.
#[derive(Clone, Debug)]
pub struct ONDRng {
    state: [u8; 32],
    step: u64,
}

impl ONDRng {
    pub fn new(seed: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[seed, b"OND_INIT"], &mut state);
        Self { state, step: 0 }
    }

    /// Seed from a label built by the caller, e.g. `"{seed}-shot-{k}"`.
    pub fn from_label(label: &str) -> Self {
        Self::new(label.as_bytes())
    }

    /// Independent child stream; does not advance `self`.
    pub fn fork(&self, ctx: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[&self.state, &self.step.to_be_bytes(), ctx, b"FORK"], &mut state);
        Self { state, step: 0 }
    }

    /// Uniform draw in `[0, 1]`.
    pub fn next_f64(&mut self, ctx: &[u8]) -> f64 {
        (self.next_u64(ctx) as f64) / (u64::MAX as f64)
    }

    pub fn next_u64(&mut self, ctx: &[u8]) -> u64 {
        self.step += 1;

        let state = self.state;
        let step_bytes = self.step.to_be_bytes();
        let mut next_state = self.state;
        shake(&[&state, &step_bytes, b"QSIM"], &mut next_state);
        self.state = next_state;

        let mut out = [0u8; 8];
        shake(&[&self.state, ctx], &mut out);

        if self.state[0] < 16 {
            let state = self.state;
            let mut next_state = self.state;
            shake(&[&state, b"SKIP"], &mut next_state);
            self.state = next_state;
        }

        u64::from_be_bytes(out)
    }

    /// Uniform draw in `[lo, hi)`.
    pub fn next_range(&mut self, lo: f64, hi: f64, ctx: &[u8]) -> f64 {
        let u = self.next_f64(ctx).min(1.0 - f64::EPSILON);
        lo + (hi - lo) * u
    }

    /// `true` with probability `p`.
    pub fn next_bool(&mut self, p: f64, ctx: &[u8]) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_f64(ctx) < p
    }

    /// Uniform index in `0..n`. Panics if `n == 0`.
    pub fn next_index(&mut self, n: usize, ctx: &[u8]) -> usize {
        assert!(n > 0, "next_index on empty range");
        (self.next_u64(ctx) % n as u64) as usize
    }
}

fn shake(parts: &[&[u8]], out: &mut [u8]) {
    let mut h = Shake256::default();
    for p in parts {
        h.update(p);
    }
    let mut r = h.finalize_xof();
    r.read(out);
}
