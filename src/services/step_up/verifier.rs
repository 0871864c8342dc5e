//! One-time code checks for step-up challenges.

use super::catalog::SensitiveAction;

pub const DEMO_CODE: &str = "123456";
pub const CODE_LENGTH: usize = 6;

/// Decides whether a submitted code confirms a challenge.
pub trait OtpVerifier: Send + Sync + std::fmt::Debug {
    fn verify(&self, action: &SensitiveAction, code: &str) -> bool;
}

/// Accepts the fixed demo code. With `lenient`, any code of `CODE_LENGTH`
/// characters is accepted too.
///
/// No secret is issued or held anywhere; this only simulates a second factor.
#[derive(Debug, Clone, Copy)]
pub struct DemoCodeVerifier {
    lenient: bool,
}

impl DemoCodeVerifier {
    pub fn new(lenient: bool) -> Self {
        Self { lenient }
    }

    pub fn strict() -> Self {
        Self::new(false)
    }
}

impl OtpVerifier for DemoCodeVerifier {
    fn verify(&self, _action: &SensitiveAction, code: &str) -> bool {
        let code = code.trim();
        code == DEMO_CODE || (self.lenient && code.chars().count() == CODE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::step_up::catalog::find_action;

    #[test]
    fn strict_mode_only_takes_the_demo_code() {
        let action = find_action("sign_agreement").unwrap();
        let verifier = DemoCodeVerifier::strict();

        assert!(verifier.verify(action, "123456"));
        assert!(!verifier.verify(action, "654321"));
    }

    #[test]
    fn lenient_mode_takes_any_six_characters() {
        let action = find_action("sign_agreement").unwrap();
        let verifier = DemoCodeVerifier::new(true);

        assert!(verifier.verify(action, "654321"));
        assert!(!verifier.verify(action, "12345"));
        assert!(!verifier.verify(action, "1234567"));
    }
}
