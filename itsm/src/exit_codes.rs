//! Stable exit codes for `itsm` CLI commands.

/// Command succeeded; nothing missing and no incompatible value.
pub const OK: i32 = 0;
/// Command failed due to invalid input documents, policy, or other errors.
pub const INVALID: i32 = 1;
/// At least one required property has no value in params or record.
pub const MISSING: i32 = 2;
/// A checked property resolved to an incompatible value.
pub const INCOMPATIBLE: i32 = 3;
