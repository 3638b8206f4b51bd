//! Deterministic, pure logic shared by the ITSM tooling.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod fields;
pub mod query;
pub mod validation;
