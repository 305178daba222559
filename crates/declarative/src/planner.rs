//! Execution planner - decides what each instance needs

use crate::diff::{AttributeChange, DiffSummary, diff_attributes};
use crate::error::{Error, Result};
use crate::resource::Provider;
use crate::schema::Schema;
use crate::types::{Address, Attributes, InstanceState};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What the executor will do with an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete, then create
    Replace,
    Delete,
}

impl Action {
    pub fn is_change(self) -> bool {
        self != Self::NoOp
    }

    /// Short verb used in plan output and logs
    pub fn verb(self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "destroy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Decide the action for one instance.
///
/// `prior` is the refreshed state (absent if never created or gone);
/// `desired` is the validated configuration (absent if removed from it).
pub fn plan_instance(
    schema: &Schema,
    prior: Option<&InstanceState>,
    desired: Option<&Attributes>,
) -> Action {
    match (prior, desired) {
        (None, None) => Action::NoOp,
        (None, Some(_)) => Action::Create,
        (Some(_), None) => Action::Delete,
        (Some(prior), Some(_)) if prior.tainted => Action::Replace,
        (Some(prior), Some(desired)) => {
            let changes = diff_attributes(schema, Some(&prior.attributes), Some(desired));
            if changes.iter().any(|c| c.forces_replacement) {
                Action::Replace
            } else if changes.is_empty() {
                Action::NoOp
            } else {
                Action::Update
            }
        }
    }
}

/// One planned instance.
#[derive(Clone)]
pub struct PlannedChange {
    pub address: Address,
    pub action: Action,
    pub prior: Option<InstanceState>,
    pub desired: Option<Attributes>,
    pub changes: Vec<AttributeChange>,
}

impl PlannedChange {
    pub fn new(
        address: Address,
        schema: &Schema,
        prior: Option<InstanceState>,
        desired: Option<Attributes>,
    ) -> Self {
        let action = plan_instance(schema, prior.as_ref(), desired.as_ref());
        let changes = match action {
            Action::NoOp => Vec::new(),
            // A tainted instance is recreated from scratch.
            Action::Replace if prior.as_ref().is_some_and(|p| p.tainted) => {
                diff_attributes(schema, None, desired.as_ref())
            }
            _ => diff_attributes(
                schema,
                prior.as_ref().map(|p| &p.attributes),
                desired.as_ref(),
            ),
        };
        Self {
            address,
            action,
            prior,
            desired,
            changes,
        }
    }
}

impl fmt::Debug for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedChange")
            .field("address", &self.address)
            .field("action", &self.action)
            .field("prior", &self.prior)
            .field("desired", &self.desired.as_ref().map(|d| d.keys().collect::<Vec<_>>()))
            .field("changes", &self.changes)
            .finish()
    }
}

/// Ordered set of planned instances.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    changes: Vec<PlannedChange>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan every instance that is either configured or in state.
    ///
    /// Raw configuration is validated against each resource's schema; all
    /// diagnostics for an instance are reported together before any
    /// handler runs. Two configured instances of one type that resolve to
    /// the same remote identity are rejected.
    pub fn build<M: Sync>(
        provider: &Provider<M>,
        desired: &BTreeMap<Address, Attributes>,
        prior: &BTreeMap<Address, InstanceState>,
    ) -> Result<Self> {
        let addresses: BTreeSet<&Address> = desired.keys().chain(prior.keys()).collect();
        let mut plan = Self::new();
        let mut owners: BTreeMap<(&str, String), &Address> = BTreeMap::new();

        for address in addresses {
            let resource = provider.resource(&address.resource_type)?;
            let schema = resource.schema();

            let coerced = match desired.get(address) {
                Some(raw) => Some(schema.coerce(raw).map_err(|diagnostics| {
                    Error::Validation {
                        address: address.to_string(),
                        diagnostics,
                    }
                })?),
                None => None,
            };

            if let Some(id) = coerced.as_ref().and_then(|attrs| resource.identity(attrs)) {
                if let Some(owner) = owners.get(&(address.resource_type.as_str(), id.clone())) {
                    return Err(Error::DuplicateIdentity {
                        address: address.to_string(),
                        id,
                        owner: owner.to_string(),
                    });
                }
                owners.insert((address.resource_type.as_str(), id), address);
            }

            plan.push(PlannedChange::new(
                address.clone(),
                schema,
                prior.get(address).cloned(),
                coerced,
            ));
        }

        Ok(plan)
    }

    /// Plan the removal of every instance in state.
    pub fn destroy<M: Sync>(
        provider: &Provider<M>,
        prior: &BTreeMap<Address, InstanceState>,
    ) -> Result<Self> {
        Self::build(provider, &BTreeMap::new(), prior)
    }

    pub fn push(&mut self, change: PlannedChange) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[PlannedChange] {
        &self.changes
    }

    /// Instances that need work
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    /// Filter plan to only include instances matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                Self {
                    changes: self
                        .changes
                        .into_iter()
                        .filter(|c| matches_filter(&c.address, resource_type, name))
                        .collect(),
                }
            }
        }
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_changes(&self.changes)
    }

    /// Check if plan has nothing to do
    pub fn is_empty(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('.') {
        Some((ty, name)) => (ty, Some(name)),
        None => (target, None),
    }
}

fn matches_filter(address: &Address, resource_type: &str, name: Option<&str>) -> bool {
    address.resource_type == resource_type && name.is_none_or(|n| address.name == n)
}
