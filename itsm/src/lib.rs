//! Reconciliation helpers for ServiceNow ITSM records.
//!
//! The crate decides whether the parameters requested for an operation, taken
//! together with the record already stored on the instance, are complete and
//! compatible, and builds the table queries used to list records.
//!
//! - **[`core`]**: Pure, deterministic logic (field maps, validation, query
//!   encoding). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (reading documents and policy files).
//!
//! Orchestration modules ([`reconcile`], [`change_task_info`]) combine core
//! logic with I/O to implement CLI commands.

pub mod change_task_info;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod reconcile;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
