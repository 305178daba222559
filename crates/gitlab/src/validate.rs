//! Validation of CI/CD variable names.
//!
//! GitLab accepts keys of 1 to 255 characters drawn from `A-Z`, `a-z`,
//! `0-9` and `_`.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum variable key length accepted by GitLab.
pub const MAX_KEY_LEN: usize = 255;

static VARIABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").unwrap_or_else(|e| panic!("invalid variable regex: {e}"))
});

/// Check a variable key, returning a human-readable reason on failure.
pub fn variable_name(key: &str) -> Result<(), String> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(format!(
            "expected length of key to be in the range (1 - {MAX_KEY_LEN}), got {}",
            key.len()
        ));
    }
    if !VARIABLE_NAME.is_match(key) {
        return Err(format!(
            "{key:?} is an invalid value for key. Only A-Z, a-z, 0-9, and _ are allowed"
        ));
    }
    Ok(())
}

/// Check a group reference: a numeric id or a (URL-encodable) full path.
pub fn group_reference(group: &str) -> Result<(), String> {
    if group.trim().is_empty() {
        return Err("group must not be empty".to_string());
    }
    if group.contains(':') {
        return Err(format!("{group:?} is not a valid group id or path"));
    }
    Ok(())
}
