//! Attribute-level diffs between prior state and desired configuration

use crate::planner::{Action, PlannedChange};
use crate::schema::Schema;
use crate::types::{Attributes, Value};
use std::fmt;

/// Shown in place of sensitive values.
pub const SENSITIVE: &str = "(sensitive value)";

/// Change to a single attribute.
#[derive(Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    /// Changing this attribute requires destroy and create
    pub forces_replacement: bool,
    pub sensitive: bool,
}

impl AttributeChange {
    pub fn is_addition(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    /// Old value for display; redacted when sensitive.
    pub fn before_display(&self) -> String {
        self.render(self.before.as_ref())
    }

    /// New value for display; redacted when sensitive.
    pub fn after_display(&self) -> String {
        self.render(self.after.as_ref())
    }

    fn render(&self, value: Option<&Value>) -> String {
        match value {
            None => "null".to_string(),
            Some(_) if self.sensitive => SENSITIVE.to_string(),
            Some(v) => v.to_string(),
        }
    }
}

impl fmt::Debug for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeChange")
            .field("name", &self.name)
            .field("before", &self.before_display())
            .field("after", &self.after_display())
            .field("forces_replacement", &self.forces_replacement)
            .field("sensitive", &self.sensitive)
            .finish()
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.name,
            self.before_display(),
            self.after_display()
        )?;
        if self.forces_replacement {
            write!(f, " (forces replacement)")?;
        }
        Ok(())
    }
}

/// Attribute changes from `prior` to `desired`, in schema order.
///
/// A missing side means the instance is being created or destroyed, so
/// every attribute shows up. Otherwise only differing attributes do.
pub fn diff_attributes(
    schema: &Schema,
    prior: Option<&Attributes>,
    desired: Option<&Attributes>,
) -> Vec<AttributeChange> {
    let whole = prior.is_none() || desired.is_none();

    schema
        .attributes()
        .iter()
        .filter_map(|attr| {
            let before = prior.and_then(|a| a.get(attr.name)).cloned();
            let after = desired.and_then(|a| a.get(attr.name)).cloned();
            if (before.is_none() && after.is_none()) || (!whole && before == after) {
                return None;
            }
            Some(AttributeChange {
                name: attr.name.to_string(),
                forces_replacement: attr.force_new && !whole && before != after,
                sensitive: attr.sensitive,
                before,
                after,
            })
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

impl DiffSummary {
    pub fn from_changes(changes: &[PlannedChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                Action::NoOp => {}
                Action::Create => summary.create += 1,
                Action::Update => summary.update += 1,
                Action::Replace => summary.replace += 1,
                Action::Delete => summary.delete += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.create + self.update + self.replace + self.delete
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to replace, {} to destroy",
            self.create, self.update, self.replace, self.delete
        )
    }
}
