use rand::Rng;

/// Arithmetic challenge shown next to the answer field. One challenge is
/// generated per form mount; a failed answer keeps the same challenge and
/// only an explicit regenerate request produces a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptchaChallenge {
    a: i32,
    b: i32,
    op: CaptchaOp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptchaOp {
    Add,
    Sub,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptchaStatus {
    #[default]
    Pending,
    Passed,
    Failed,
}

impl CaptchaChallenge {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_rng(&mut rng)
    }

    pub fn with_rng<R: Rng>(rng: &mut R) -> Self {
        let a = rng.gen_range(2..=9);
        let b = rng.gen_range(1..=9);
        let op = if rng.gen_bool(0.5) {
            CaptchaOp::Add
        } else {
            CaptchaOp::Sub
        };
        // Keep subtraction results non-negative so the expected answer
        // never needs a sign.
        match op {
            CaptchaOp::Sub if b > a => Self { a: b, b: a, op },
            _ => Self { a, b, op },
        }
    }

    #[cfg(test)]
    pub fn fixed(a: i32, b: i32, op: CaptchaOp) -> Self {
        Self { a, b, op }
    }

    pub fn prompt(&self) -> String {
        let sym = match self.op {
            CaptchaOp::Add => '+',
            CaptchaOp::Sub => '-',
        };
        format!("{} {} {} =", self.a, sym, self.b)
    }

    pub fn expected(&self) -> i32 {
        match self.op {
            CaptchaOp::Add => self.a + self.b,
            CaptchaOp::Sub => self.a - self.b,
        }
    }

    /// Exact-match comparison against the expected value.
    pub fn verify(&self, answer: &str) -> bool {
        answer.trim() == self.expected().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_is_exact_match() {
        let c = CaptchaChallenge::fixed(4, 3, CaptchaOp::Add);
        assert_eq!(c.prompt(), "4 + 3 =");
        assert!(c.verify("7"));
        assert!(c.verify(" 7 "));
        assert!(!c.verify("8"));
        assert!(!c.verify(""));
        assert!(!c.verify("seven"));
    }

    #[test]
    fn subtraction_never_goes_negative() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 0x9e3779b97f4a7c15);
        for _ in 0..64 {
            let c = CaptchaChallenge::with_rng(&mut rng);
            assert!(c.expected() >= 0, "negative answer for {}", c.prompt());
        }
    }
}
