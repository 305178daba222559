//! Instance identifier for group variables: `group:key`.
//!
//! The identifier is the only place the group survives between runs (the
//! API does not echo it back), so the format must stay stable.

/// Neither GitLab group paths nor variable keys may contain it.
pub const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("unexpected ID format ({0:?}); expected group:key")]
    Malformed(String),
}

pub fn build(group: &str, key: &str) -> String {
    format!("{group}{SEPARATOR}{key}")
}

pub fn parse(id: &str) -> Result<(String, String), IdError> {
    let mut parts = id.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(key), None) if !group.is_empty() && !key.is_empty() => {
            Ok((group.to_string(), key.to_string()))
        }
        _ => Err(IdError::Malformed(id.to_string())),
    }
}
