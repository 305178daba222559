//! Resource types managed by glvar
//!
//! Each resource implements [`declarative::Resource`] against a
//! [`gitlab::Client`]; [`provider`] registers all of them.

pub mod group_variable;
pub mod id;

pub use group_variable::GroupVariableResource;

use declarative::{Provider, Resource};
use gitlab::Client;
use std::collections::BTreeSet;

/// Registry of every resource type glvar knows about.
pub fn provider(client: Client) -> Provider<Client> {
    Provider::new(client).with_resource(GroupVariableResource::new())
}

/// Attributes of `resource_type` whose values must never be displayed.
///
/// `None` for a type glvar does not know; callers redact everything then.
pub fn sensitive_attributes(resource_type: &str) -> Option<BTreeSet<String>> {
    match resource_type {
        group_variable::TYPE_NAME => Some(GroupVariableResource::new().schema().sensitive_names()),
        _ => None,
    }
}
