//! Progress and confirmation hooks
//!
//! These traits keep the runtime free of any terminal UI dependency; the
//! binary plugs in spinners and prompts.

use crate::planner::Action;
use crate::types::{Address, ApplyResult};
use anyhow::Result;

/// Progress callback for execution operations
///
/// Methods take `&self` because instances are applied from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any instance is applied
    fn on_start(&self, total: usize);

    /// Called when a worker picks up an instance
    fn on_instance_start(&self, address: &Address, action: Action);

    /// Called when an instance finishes, successfully or not
    fn on_instance_complete(&self, address: &Address, result: &ApplyResult);

    /// Called once after the last instance
    fn on_finish(&self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&self, _total: usize) {}
    fn on_instance_start(&self, _address: &Address, _action: Action) {}
    fn on_instance_complete(&self, _address: &Address, _result: &ApplyResult) {}
    fn on_finish(&self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
