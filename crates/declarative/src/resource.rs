//! Resource trait and provider registry
//!
//! A resource type is a schema plus five handlers. Handlers receive the
//! instance's [`ResourceData`] and the provider's shared client (`Meta`),
//! and report the remote object's existence through the identifier.

use crate::data::ResourceData;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Attributes;
use std::collections::BTreeMap;

/// Lifecycle handlers for one resource type.
///
/// Contract shared by all handlers:
/// - a handler that finds the remote object gone clears the identifier and
///   returns `Ok(())`;
/// - any other failure is returned unchanged so callers can inspect it;
/// - handlers run sequentially for a given instance, but different
///   instances may be handled concurrently.
pub trait Resource: Send + Sync {
    /// Shared client handed to every handler.
    type Meta: Sync;

    /// Type name used in addresses, e.g. `gitlab_group_variable`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    /// Create the remote object and set the identifier.
    fn create(&self, data: &mut ResourceData, meta: &Self::Meta) -> anyhow::Result<()>;

    /// Refresh attributes from the remote object.
    fn read(&self, data: &mut ResourceData, meta: &Self::Meta) -> anyhow::Result<()>;

    /// Apply in-place changes.
    fn update(&self, data: &mut ResourceData, meta: &Self::Meta) -> anyhow::Result<()>;

    fn delete(&self, data: &mut ResourceData, meta: &Self::Meta) -> anyhow::Result<()>;

    /// Turn an operator-supplied identifier into instances to read.
    fn import(&self, data: ResourceData, meta: &Self::Meta) -> anyhow::Result<Vec<ResourceData>>;

    /// Identifier that validated attributes would create, if derivable
    /// before any call. Two configured instances must not share one.
    fn identity(&self, _attributes: &Attributes) -> Option<String> {
        None
    }
}

/// Import that accepts the identifier as-is; the following Read validates it.
pub fn import_passthrough(data: ResourceData) -> anyhow::Result<Vec<ResourceData>> {
    Ok(vec![data])
}

/// A boxed resource for type-erased storage
pub type BoxedResource<M> = Box<dyn Resource<Meta = M>>;

/// Registry of resource types sharing one client.
pub struct Provider<M> {
    meta: M,
    resources: BTreeMap<&'static str, BoxedResource<M>>,
}

impl<M: Sync> Provider<M> {
    pub fn new(meta: M) -> Self {
        Self {
            meta,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, resource: impl Resource<Meta = M> + 'static) -> Self {
        self.resources.insert(resource.type_name(), Box::new(resource));
        self
    }

    pub fn meta(&self) -> &M {
        &self.meta
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn Resource<Meta = M>> {
        match self.resources.get(type_name) {
            Some(resource) => Ok(resource.as_ref()),
            None => Err(Error::UnknownResourceType(type_name.to_string())),
        }
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}
