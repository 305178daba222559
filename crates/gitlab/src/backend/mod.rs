//! Backend abstraction for the group variables API.
//!
//! The [`Backend`] trait maps 1-to-1 onto GitLab's group-level variable
//! endpoints, allowing for different implementations (HTTP, in-memory for
//! tests).

pub mod http;
pub mod memory;

use crate::error::Result;
use crate::types::{CreateVariableOptions, GroupVariable, UpdateVariableOptions};

/// Backend trait for group variable operations.
///
/// `group` is a numeric group id or a full group path (`parent/child`);
/// implementations take care of encoding it.
pub trait Backend: Send + Sync {
    /// `POST /groups/:group/variables`
    fn create_variable(&self, group: &str, opts: &CreateVariableOptions) -> Result<GroupVariable>;

    /// `GET /groups/:group/variables/:key`
    fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable>;

    /// `PUT /groups/:group/variables/:key`
    fn update_variable(
        &self,
        group: &str,
        key: &str,
        opts: &UpdateVariableOptions,
    ) -> Result<GroupVariable>;

    /// `DELETE /groups/:group/variables/:key`
    fn remove_variable(&self, group: &str, key: &str) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn create_variable(&self, group: &str, opts: &CreateVariableOptions) -> Result<GroupVariable> {
        (**self).create_variable(group, opts)
    }

    fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable> {
        (**self).get_variable(group, key)
    }

    fn update_variable(
        &self,
        group: &str,
        key: &str,
        opts: &UpdateVariableOptions,
    ) -> Result<GroupVariable> {
        (**self).update_variable(group, key, opts)
    }

    fn remove_variable(&self, group: &str, key: &str) -> Result<()> {
        (**self).remove_variable(group, key)
    }
}
