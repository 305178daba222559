//! In-memory backend.
//!
//! Behaves like the group variables API for a single GitLab instance and
//! records every call, so reconciliation code can be exercised without a
//! server. Failures can be injected per operation.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{CreateVariableOptions, GroupVariable, UpdateVariableOptions};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Remote operation kinds, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST`
    Create,
    /// `GET`
    Get,
    /// `PUT`
    Update,
    /// `DELETE`
    Remove,
}

/// A recorded call. Values are never recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Which endpoint was hit.
    pub operation: Operation,
    /// Group reference as passed by the caller.
    pub group: String,
    /// Variable key (path key, or body key for creates).
    pub key: String,
}

impl Call {
    /// Shorthand constructor, handy in assertions.
    pub fn new(operation: Operation, group: &str, key: &str) -> Self {
        Self {
            operation,
            group: group.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Default)]
struct Inner {
    variables: BTreeMap<(String, String), GroupVariable>,
    calls: Vec<Call>,
    failures: VecDeque<(Operation, u16)>,
}

/// In-memory group variables store.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed a variable directly, bypassing call recording.
    pub fn insert(&self, group: &str, variable: GroupVariable) {
        self.lock()
            .variables
            .insert((group.to_string(), variable.key.clone()), variable);
    }

    /// Look up a stored variable.
    pub fn variable(&self, group: &str, key: &str) -> Option<GroupVariable> {
        self.lock()
            .variables
            .get(&(group.to_string(), key.to_string()))
            .cloned()
    }

    /// Delete a variable as if someone removed it in the GitLab UI.
    pub fn remove_out_of_band(&self, group: &str, key: &str) -> Option<GroupVariable> {
        self.lock()
            .variables
            .remove(&(group.to_string(), key.to_string()))
    }

    /// Number of stored variables.
    pub fn len(&self) -> usize {
        self.lock().variables.len()
    }

    /// Whether no variables are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next call of `operation` fail with `status`.
    pub fn fail_next(&self, operation: Operation, status: u16) {
        self.lock().failures.push_back((operation, status));
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Record the call and pop an injected failure for it, if any.
    fn begin(inner: &mut Inner, operation: Operation, group: &str, key: &str) -> Result<()> {
        inner.calls.push(Call::new(operation, group, key));
        if let Some(pos) = inner.failures.iter().position(|(op, _)| *op == operation) {
            if let Some((_, status)) = inner.failures.remove(pos) {
                return Err(Error::status(status));
            }
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn create_variable(&self, group: &str, opts: &CreateVariableOptions) -> Result<GroupVariable> {
        let mut inner = self.lock();
        Self::begin(&mut inner, Operation::Create, group, &opts.key)?;

        let id = (group.to_string(), opts.key.clone());
        if inner.variables.contains_key(&id) {
            return Err(Error::http(
                format!("HTTP 400: key {} has already been taken", opts.key),
                Some(400),
            ));
        }

        let variable = GroupVariable {
            key: opts.key.clone(),
            value: opts.value.clone(),
            protected: opts.protected,
            variable_type: "env_var".to_string(),
            masked: false,
            environment_scope: Some("*".to_string()),
        };
        inner.variables.insert(id, variable.clone());
        Ok(variable)
    }

    fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable> {
        let mut inner = self.lock();
        Self::begin(&mut inner, Operation::Get, group, key)?;

        inner
            .variables
            .get(&(group.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::status(404))
    }

    fn update_variable(
        &self,
        group: &str,
        key: &str,
        opts: &UpdateVariableOptions,
    ) -> Result<GroupVariable> {
        let mut inner = self.lock();
        Self::begin(&mut inner, Operation::Update, group, key)?;

        if opts.key != key {
            return Err(Error::http(
                "HTTP 400: key in body does not match path",
                Some(400),
            ));
        }

        let variable = inner
            .variables
            .get_mut(&(group.to_string(), key.to_string()))
            .ok_or_else(|| Error::status(404))?;
        variable.value = opts.value.clone();
        variable.protected = opts.protected;
        Ok(variable.clone())
    }

    fn remove_variable(&self, group: &str, key: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::begin(&mut inner, Operation::Remove, group, key)?;

        inner
            .variables
            .remove(&(group.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::status(404))
    }
}
