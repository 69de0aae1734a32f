/// Student email domain allowed to post.
pub const DEFAULT_STUDENT_EMAIL_SUFFIX: &str = "@aggies.ncat.edu";

/// Returns `true` if `email` (trimmed, case-insensitive) is an address under `suffix`.
///
/// The suffix alone, with nothing before it, is not an address and is rejected.
pub fn is_eligible_email(email: &str, suffix: &str) -> bool {
    let email = email.trim().to_lowercase();
    let suffix = suffix.trim().to_lowercase();
    if suffix.is_empty() {
        return false;
    }
    match email.strip_suffix(&suffix) {
        Some(local) => !local.is_empty() && !local.contains('@'),
        None => false,
    }
}

/// The configured posting rule.
#[derive(Debug, Clone)]
pub struct EligibilityPolicy {
    suffix: String,
}

impl EligibilityPolicy {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn allows(&self, email: &str) -> bool {
        is_eligible_email(email, &self.suffix)
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STUDENT_EMAIL_SUFFIX)
    }
}
