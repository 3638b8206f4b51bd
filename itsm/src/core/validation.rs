//! Reconciliation of requested parameters against an existing remote record.
//!
//! Parameters always take precedence over the record. The two checks below
//! disagree on what "unset" means, and both readings are kept:
//!
//! - [`missing_from_params_and_remote`] treats an empty record value as unset,
//!   so an empty string stored remotely does not satisfy a requirement.
//! - [`check_value_incompatibility`] only falls back to the record when the
//!   parameter is absent; an empty string is a real value there.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::core::fields::FieldMap;

/// Contract violations detected while reconciling parameters and records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Checked property names are not all fields of the supplied record.
    #[error("Given parameters are not a subset of record fields (missing: {})", .missing.join(", "))]
    NotSubset { missing: Vec<String> },

    /// A value is neither text nor the absence marker.
    #[error("Expected '{name}' to be text or None, got {actual}")]
    WrongType { name: String, actual: &'static str },

    /// A parameter or record document is not a key/value object.
    #[error("Expected a mapping of field names to values, got {actual}")]
    NotAnObject { actual: &'static str },
}

/// Outcome of a value-compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCheck {
    /// False only when the effective value is one of the incompatible values.
    pub compatible: bool,
    /// Effective value after applying params-over-record precedence.
    pub value: Option<String>,
}

/// Return the names from `properties` that have no value in `params` nor in
/// `record`, preserving input order.
///
/// A parameter counts as set whenever it is not absent, including the empty
/// string. A record value only counts when it is non-empty. An empty record
/// is handled exactly like a missing one.
///
/// Fails with [`ValidationError::NotSubset`] if a non-empty record lacks any
/// of the checked names.
pub fn missing_from_params_and_remote(
    properties: &[&str],
    params: &FieldMap,
    record: Option<&FieldMap>,
) -> Result<Vec<String>, ValidationError> {
    let record = record.filter(|record| !record.is_empty());

    if let Some(record) = record {
        ensure_subset(properties, record.keys())?;
    }

    let missing = properties
        .iter()
        .filter(|name| {
            let in_params = params.get(name).is_some();
            let in_record = record
                .and_then(|record| record.get(name))
                .is_some_and(|value| !value.is_empty());
            !in_params && !in_record
        })
        .map(|name| name.to_string())
        .collect();
    Ok(missing)
}

/// Fail with [`ValidationError::NotSubset`] unless every name in
/// `properties` is one of `record_fields`.
///
/// No fields at all means no record, which has nothing to be a subset of.
/// Loaders call this on raw record keys before any value is type checked.
pub fn ensure_subset<'a, I>(properties: &[&str], record_fields: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields: HashSet<&str> = record_fields.into_iter().collect();
    if fields.is_empty() {
        return Ok(());
    }

    let not_in_record: Vec<String> = properties
        .iter()
        .filter(|name| !fields.contains(**name))
        .map(|name| name.to_string())
        .collect();
    if !not_in_record.is_empty() {
        return Err(ValidationError::NotSubset {
            missing: not_in_record,
        });
    }
    Ok(())
}

/// Resolve the effective value of `property` and report whether it avoids
/// every entry of `incompatible`.
///
/// The record is consulted only when the parameter is absent. An absent
/// effective value is always compatible.
pub fn check_value_incompatibility(
    incompatible: &[&str],
    property: &str,
    params: &FieldMap,
    record: Option<&FieldMap>,
) -> ValueCheck {
    let value = params
        .get(property)
        .or_else(|| record.and_then(|record| record.get(property)));

    let compatible = match value {
        Some(value) => !incompatible.iter().any(|candidate| *candidate == value),
        None => true,
    };

    ValueCheck {
        compatible,
        value: value.map(str::to_string),
    }
}
