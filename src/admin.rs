//! Admin gate.
//!
//! A single shared password compared verbatim. This is a speed bump for the
//! content panel, not an authentication mechanism: anyone who can read the
//! deployed configuration can read the password, and there are no accounts,
//! sessions, or rate limits. A deployment with real users and sensitive
//! data must put actual authentication in front of the admin surface.

/// Gate over the admin surface.
#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Plaintext comparison. An empty configured password locks the gate
    /// entirely rather than letting empty input through.
    pub fn check(&self, attempt: &str) -> bool {
        !self.password.is_empty() && attempt == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password_passes() {
        let gate = AdminGate::new("open-sesame");
        assert!(gate.check("open-sesame"));
    }

    #[test]
    fn test_wrong_password_fails() {
        let gate = AdminGate::new("open-sesame");
        assert!(!gate.check("open sesame"));
        assert!(!gate.check(""));
        assert!(!gate.check("OPEN-SESAME"));
    }

    #[test]
    fn test_empty_configured_password_locks_the_gate() {
        let gate = AdminGate::new("");
        assert!(!gate.check(""));
        assert!(!gate.check("anything"));
    }
}
