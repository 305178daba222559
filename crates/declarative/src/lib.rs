//! # Declarative
//!
//! A small runtime for declaratively managed remote objects.
//!
//! A resource type is a [`Schema`] plus five lifecycle handlers (create,
//! read, update, delete, import). The runtime validates configuration
//! against the schema, refreshes persisted state through Read, plans what
//! each instance needs and runs the handlers to converge.
//!
//! ## Core Concepts
//!
//! - **Resource**: lifecycle handlers for one remote object type
//! - **ResourceData**: identifier and attributes handed to a handler; an
//!   empty identifier after a handler returns means the object is gone
//! - **ExecutionPlan**: create / update / replace / delete per instance
//! - **Executor**: applies a plan with parallelism across instances
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecutionPlan, ExecuteOptions, Provider, AutoConfirm, NoProgress};
//!
//! let provider = Provider::new(client).with_resource(MyResource::new());
//! let refreshed = declarative::refresh_all(&provider, &state)?;
//! let plan = ExecutionPlan::build(&provider, &desired, &refreshed.state)?;
//! let report = declarative::execute(
//!     &provider,
//!     &plan,
//!     &ExecuteOptions::default(),
//!     &NoProgress,
//!     &mut AutoConfirm,
//! )?;
//! ```
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod data;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod refresh;
pub mod resource;
pub mod schema;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use data::ResourceData;
pub use diff::{AttributeChange, DiffSummary, SENSITIVE, diff_attributes};
pub use error::{Error, Result};
pub use executor::{ExecuteReport, InstanceOutcome, StateChange, apply_change, execute};
pub use planner::{Action, ExecutionPlan, PlannedChange, plan_instance};
pub use refresh::{RefreshReport, import_instance, refresh_all, refresh_instance};
pub use resource::{BoxedResource, Provider, Resource, import_passthrough};
pub use schema::{Attribute, AttributeType, Diagnostic, Schema, Validator};
pub use types::{
    Address, ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, InstanceState, Value,
};
