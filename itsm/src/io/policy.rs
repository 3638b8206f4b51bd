//! Reconciliation policy stored as TOML.
//!
//! ```toml
//! required = ["short_description", "assignment_group"]
//!
//! [[incompatible]]
//! property = "state"
//! values = ["closed", "canceled"]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

/// Which properties must be set and which values a property must avoid.
///
/// This file is intended to be edited by humans. Both sections default to
/// empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Policy {
    /// Properties that need a value in the params or in the record.
    pub required: Vec<String>,

    /// Per-property lists of disallowed values, checked in order.
    pub incompatible: Vec<IncompatibleRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IncompatibleRule {
    pub property: String,
    pub values: Vec<String>,
}

impl Policy {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in &self.required {
            if name.trim().is_empty() {
                return Err(anyhow!("required entries must be non-empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(anyhow!("duplicate required property '{}'", name));
            }
        }
        for rule in &self.incompatible {
            if rule.property.trim().is_empty() {
                return Err(anyhow!("incompatible.property must be non-empty"));
            }
            if rule.values.is_empty() {
                return Err(anyhow!(
                    "incompatible.values for '{}' must be a non-empty array",
                    rule.property
                ));
            }
        }
        Ok(())
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.required.iter().map(String::as_str).collect()
    }
}

impl IncompatibleRule {
    pub fn value_refs(&self) -> Vec<&str> {
        self.values.iter().map(String::as_str).collect()
    }
}

/// Load and validate a policy from a TOML file.
pub fn load_policy(path: &Path) -> Result<Policy> {
    debug!(path = %path.display(), "loading policy");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let policy: Policy =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    policy
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    debug!(
        required = policy.required.len(),
        incompatible = policy.incompatible.len(),
        "policy loaded"
    );
    Ok(policy)
}
