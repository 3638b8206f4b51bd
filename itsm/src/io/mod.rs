//! I/O helpers for `itsm` commands.

pub mod documents;
pub mod policy;
