//! Policy-driven reconciliation for `itsm reconcile`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::core::fields::FieldMap;
use crate::core::validation::{check_value_incompatibility, missing_from_params_and_remote};
use crate::io::documents::load_inputs;
use crate::io::policy::{Policy, load_policy};

/// Result of checking one incompatible-values rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyCheck {
    pub property: String,
    pub compatible: bool,
    pub value: Option<String>,
}

/// Everything a policy found about a params/record pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Required properties without a value, in policy order.
    pub missing: Vec<String>,
    /// One entry per incompatible rule, in policy order.
    pub checks: Vec<PropertyCheck>,
}

/// Overall classification of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Clean,
    Missing,
    Incompatible,
}

impl ReconcileReport {
    /// Missing properties take priority over incompatible values.
    pub fn outcome(&self) -> ReconcileOutcome {
        if !self.missing.is_empty() {
            return ReconcileOutcome::Missing;
        }
        if self.checks.iter().any(|check| !check.compatible) {
            return ReconcileOutcome::Incompatible;
        }
        ReconcileOutcome::Clean
    }
}

/// Apply `policy` to in-memory params and an optional record.
pub fn reconcile(
    policy: &Policy,
    params: &FieldMap,
    record: Option<&FieldMap>,
) -> Result<ReconcileReport> {
    let missing = missing_from_params_and_remote(&policy.required_names(), params, record)?;

    let checks = policy
        .incompatible
        .iter()
        .map(|rule| {
            let check =
                check_value_incompatibility(&rule.value_refs(), &rule.property, params, record);
            PropertyCheck {
                property: rule.property.clone(),
                compatible: check.compatible,
                value: check.value,
            }
        })
        .collect();

    Ok(ReconcileReport { missing, checks })
}

/// Load policy, params and record from disk and reconcile them.
pub fn reconcile_from_files(
    policy_path: &Path,
    params_path: &Path,
    record_path: Option<&Path>,
) -> Result<ReconcileReport> {
    let policy = load_policy(policy_path)?;
    let (params, record) = load_inputs(&policy.required_names(), params_path, record_path)?;

    let report = reconcile(&policy, &params, record.as_ref())
        .with_context(|| format!("reconcile against {}", policy_path.display()))?;
    info!(
        missing = report.missing.len(),
        incompatible = report.checks.iter().filter(|check| !check.compatible).count(),
        "reconciliation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::ValidationError;
    use crate::io::policy::IncompatibleRule;
    use crate::test_support::{Fixtures, fields};
    use serde_json::json;

    fn policy() -> Policy {
        Policy {
            required: vec!["short_description".to_string(), "assigned_to".to_string()],
            incompatible: vec![IncompatibleRule {
                property: "state".to_string(),
                values: vec!["closed".to_string(), "canceled".to_string()],
            }],
        }
    }

    #[test]
    fn clean_when_record_fills_gaps() {
        let params = fields(&[
            ("short_description", Some("Upgrade SAP")),
            ("assigned_to", None),
            ("state", None),
        ]);
        let record = fields(&[
            ("short_description", Some("old")),
            ("assigned_to", Some("abel.tuter")),
            ("state", Some("new")),
        ]);

        let report = reconcile(&policy(), &params, Some(&record)).expect("reconcile");
        assert_eq!(report.outcome(), ReconcileOutcome::Clean);
        assert_eq!(
            report.checks,
            vec![PropertyCheck {
                property: "state".to_string(),
                compatible: true,
                value: Some("new".to_string()),
            }]
        );
    }

    #[test]
    fn missing_outranks_incompatible() {
        let params = fields(&[
            ("short_description", None),
            ("assigned_to", None),
            ("state", Some("closed")),
        ]);

        let report = reconcile(&policy(), &params, None).expect("reconcile");
        assert_eq!(report.missing, vec!["short_description", "assigned_to"]);
        assert_eq!(report.outcome(), ReconcileOutcome::Missing);
    }

    #[test]
    fn incompatible_record_state_is_reported() {
        let params = fields(&[
            ("short_description", Some("x")),
            ("assigned_to", Some("y")),
            ("state", None),
        ]);
        let record = fields(&[
            ("short_description", None),
            ("assigned_to", None),
            ("state", Some("canceled")),
        ]);

        let report = reconcile(&policy(), &params, Some(&record)).expect("reconcile");
        assert_eq!(report.outcome(), ReconcileOutcome::Incompatible);
        assert_eq!(report.checks[0].value.as_deref(), Some("canceled"));
    }

    #[test]
    fn record_without_required_field_is_an_error() {
        let params = fields(&[("short_description", Some("x")), ("assigned_to", None)]);
        let record = fields(&[("short_description", Some("x"))]);

        let err = reconcile(&policy(), &params, Some(&record)).expect_err("subset");
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::NotSubset { .. })
        ));
    }

    #[test]
    fn reconcile_from_files_reads_all_inputs() {
        let fixtures = Fixtures::new().expect("fixtures");
        let policy_path = fixtures
            .write("itsm.toml", "required = [\"short_description\"]\n")
            .expect("policy");
        let params_path = fixtures
            .write_json("params.json", &json!({"short_description": null}))
            .expect("params");
        let record_path = fixtures
            .write_json("record.json", &json!({"short_description": "Upgrade"}))
            .expect("record");

        let report = reconcile_from_files(&policy_path, &params_path, Some(&record_path))
            .expect("reconcile");
        assert_eq!(report.outcome(), ReconcileOutcome::Clean);
    }

    #[test]
    fn reconcile_from_files_reports_subset_before_wrong_types() {
        let fixtures = Fixtures::new().expect("fixtures");
        let policy_path = fixtures
            .write("itsm.toml", "required = [\"a\", \"b\"]\n")
            .expect("policy");
        let params_path = fixtures
            .write_json("params.json", &json!({"a": 1, "b": 2}))
            .expect("params");
        let record_path = fixtures
            .write_json("record.json", &json!({"a": 1}))
            .expect("record");

        let err = reconcile_from_files(&policy_path, &params_path, Some(&record_path))
            .expect_err("subset");
        let message = format!("{:#}", err);
        assert!(message.contains("not a subset"), "{message}");
    }
}
