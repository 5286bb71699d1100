//! Barring password

use std::fmt;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 4;
/// Maximum accepted password length
pub const MAX_PASSWORD_LEN: usize = 8;

/// Call barring password as entered by the user
///
/// `Debug` is redacted so the value never ends up in logs. Not serializable.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Length within `[MIN_PASSWORD_LEN, MAX_PASSWORD_LEN]`
    pub fn is_valid(&self) -> bool {
        is_valid_password(&self.0)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Check a raw entry against the password length rule
pub fn is_valid_password(text: &str) -> bool {
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&text.chars().count())
}
