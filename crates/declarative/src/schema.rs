//! Schema descriptors for resources
//!
//! A [`Schema`] lists the attributes a resource accepts, their types, whether
//! a change can be applied in place or forces replacement, defaults, and
//! which values are sensitive. Configuration is checked against the schema
//! before any lifecycle handler runs.

use crate::types::{Attributes, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Plan-time check on a string attribute. Returns the reason on failure.
pub type Validator = fn(&str) -> Result<(), String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// One validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Attribute the problem is attached to, if any
    pub attribute: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn attribute(name: &str, message: impl Into<String>) -> Self {
        Self {
            attribute: Some(name.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Declaration of a single attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub required: bool,
    pub default: Option<Value>,
    /// A change cannot be applied in place; destroy and create instead
    pub force_new: bool,
    /// Redacted in plans, logs and debug output
    pub sensitive: bool,
    pub validator: Option<Validator>,
}

impl Attribute {
    fn new(name: &'static str, ty: AttributeType, required: bool) -> Self {
        Self {
            name,
            ty,
            required,
            default: None,
            force_new: false,
            sensitive: false,
            validator: None,
        }
    }

    pub fn required_string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String, true)
    }

    pub fn optional_string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String, false)
    }

    pub fn required_bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool, true)
    }

    pub fn optional_bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool, false)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Convert a raw configuration value to this attribute's type.
    ///
    /// Numbers and booleans are accepted for strings; `"true"`/`"false"`
    /// are accepted for booleans. Messages never echo the value.
    fn coerce(&self, raw: &Value) -> Result<Value, String> {
        match (self.ty, raw) {
            (AttributeType::String, Value::String(_)) | (AttributeType::Bool, Value::Bool(_)) => {
                Ok(raw.clone())
            }
            (AttributeType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (AttributeType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (AttributeType::Bool, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("expected bool, got a string that is not \"true\" or \"false\"".into()),
            },
            (AttributeType::Bool, Value::Number(_)) => Err("expected bool, got number".into()),
        }
    }
}

/// The set of attributes a resource type accepts.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.sensitive)
    }

    pub fn sensitive_names(&self) -> BTreeSet<String> {
        self.attributes
            .iter()
            .filter(|a| a.sensitive)
            .map(|a| a.name.to_string())
            .collect()
    }

    pub fn force_new_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.force_new)
    }

    /// Check raw configuration against the schema.
    ///
    /// Returns the typed attributes with defaults applied, or every problem
    /// found at once.
    pub fn coerce(&self, raw: &Attributes) -> Result<Attributes, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        let mut out = Attributes::new();

        for name in raw.keys() {
            if self.attribute(name).is_none() {
                diagnostics.push(Diagnostic::attribute(
                    name,
                    "unsupported argument; not declared by this resource type",
                ));
            }
        }

        for attr in &self.attributes {
            let value = match raw.get(attr.name) {
                Some(raw_value) => match attr.coerce(raw_value) {
                    Ok(v) => v,
                    Err(message) => {
                        diagnostics.push(Diagnostic::attribute(attr.name, message));
                        continue;
                    }
                },
                None => match &attr.default {
                    Some(default) => default.clone(),
                    None if attr.required => {
                        diagnostics.push(Diagnostic::attribute(
                            attr.name,
                            "the argument is required, but no definition was found",
                        ));
                        continue;
                    }
                    None => continue,
                },
            };

            if let (Some(validator), Value::String(s)) = (attr.validator, &value) {
                if let Err(message) = validator(s) {
                    diagnostics.push(Diagnostic::attribute(attr.name, message));
                    continue;
                }
            }

            out.insert(attr.name.to_string(), value);
        }

        if diagnostics.is_empty() {
            Ok(out)
        } else {
            Err(diagnostics)
        }
    }
}
