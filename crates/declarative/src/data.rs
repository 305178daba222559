//! Per-instance handle passed to lifecycle handlers

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{Attributes, InstanceState, Value};
use std::collections::BTreeSet;
use std::fmt;

const REDACTED: &str = "(sensitive value)";

/// Identifier and attribute values of one resource instance.
///
/// Handlers read declared attributes from it, write observed attributes
/// back, and signal existence through the identifier: an empty identifier
/// after a handler returns means the remote object is gone.
#[derive(Clone, Default)]
pub struct ResourceData {
    id: String,
    attributes: Attributes,
    sensitive: BTreeSet<String>,
}

impl ResourceData {
    pub fn new(schema: &Schema) -> Self {
        Self {
            id: String::new(),
            attributes: Attributes::new(),
            sensitive: schema.sensitive_names(),
        }
    }

    pub fn from_attributes(schema: &Schema, attributes: Attributes) -> Self {
        Self {
            attributes,
            ..Self::new(schema)
        }
    }

    pub fn from_state(schema: &Schema, state: &InstanceState) -> Self {
        Self {
            id: state.id.clone(),
            attributes: state.attributes.clone(),
            sensitive: schema.sensitive_names(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the remote object as gone.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(Error::WrongType {
                name: name.to_string(),
                expected: "string",
            }),
            None => Err(Error::MissingAttribute(name.to_string())),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(Error::WrongType {
                name: name.to_string(),
                expected: "bool",
            }),
            None => Err(Error::MissingAttribute(name.to_string())),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Snapshot for persistence.
    pub fn to_state(&self, resource_type: &str) -> InstanceState {
        InstanceState {
            resource_type: resource_type.to_string(),
            id: self.id.clone(),
            tainted: false,
            attributes: self.attributes.clone(),
        }
    }
}

impl fmt::Debug for ResourceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"id", &self.id);
        for (name, value) in &self.attributes {
            if self.sensitive.contains(name) {
                map.entry(name, &REDACTED);
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}
