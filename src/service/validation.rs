use std::sync::LazyLock;

use regex::Regex;

use super::ServiceError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 6;

/// Collects every problem with an input before failing.
#[derive(Debug, Default)]
pub struct Checks {
    problems: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.problems.push(message.into());
    }

    pub fn ensure(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.fail(message);
        }
    }

    /// A required text field: present and not blank after trimming.
    pub fn required_text(&mut self, value: Option<&str>, max: usize, label: &str) {
        match value.map(str::trim) {
            None | Some("") => self.fail(format!("{label} is required")),
            Some(v) => self.max_len(v, max, label),
        }
    }

    /// A text field that may be omitted but not sent blank.
    pub fn non_blank(&mut self, value: Option<&str>, max: usize, label: &str) {
        if let Some(v) = value.map(str::trim) {
            if v.is_empty() {
                self.fail(format!("{label} cannot be empty"));
            } else {
                self.max_len(v, max, label);
            }
        }
    }

    pub fn optional_text(&mut self, value: Option<&str>, max: usize, label: &str) {
        if let Some(v) = value {
            self.max_len(v.trim(), max, label);
        }
    }

    fn max_len(&mut self, value: &str, max: usize, label: &str) {
        if value.chars().count() > max {
            self.fail(format!("{label} must be {max} characters or less"));
        }
    }

    pub fn email(&mut self, value: Option<&str>, required: bool) {
        match value.map(str::trim) {
            None if required => self.fail("Email is required"),
            None => {}
            Some(v) if !is_valid_email(v) => self.fail("Valid email is required"),
            Some(_) => {}
        }
    }

    pub fn password(&mut self, value: Option<&str>, label: &str) {
        match value {
            None | Some("") => self.fail(format!("{label} is required")),
            Some(v) if v.chars().count() < MIN_PASSWORD_LEN => self.fail(format!(
                "{label} must be at least {MIN_PASSWORD_LEN} characters long"
            )),
            Some(_) => {}
        }
    }

    /// Takes over another set of problems, each tagged with `prefix`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Checks) {
        self.problems
            .extend(other.problems.into_iter().map(|p| format!("{prefix}{p}")));
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.problems))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Trimmed copy of an optional text field.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
