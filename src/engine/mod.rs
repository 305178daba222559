//! Terminal front end for the declarative runtime
//!
//! 1. Display - render the plan with redacted values
//! 2. Executing - confirm, apply with a progress bar, fold outcomes into state

pub mod differ;
pub mod executor;

pub use differ::display_plan;
pub use executor::{ApplyOptions, apply, print_summary};
