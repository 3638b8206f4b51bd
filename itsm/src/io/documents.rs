//! Loading of parameter, record and query documents from disk.
//!
//! Parameter maps and records are flat JSON objects. They are converted into
//! [`FieldMap`]s right here, so a value of the wrong type is rejected before
//! any reconciliation runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::change_task_info::TaskInfoParams;
use crate::core::fields::FieldMap;
use crate::core::validation::ensure_subset;

const CHANGE_TASK_INFO_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/change_task_info/v1.schema.json"
));

/// Read and parse a JSON document.
pub fn load_json(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Load a parameter map or record document.
pub fn load_field_map(path: &Path) -> Result<FieldMap> {
    debug!(path = %path.display(), "loading field map");
    let value = load_json(path)?;
    let fields =
        FieldMap::from_json(&value).with_context(|| format!("validate {}", path.display()))?;
    debug!(path = %path.display(), fields = fields.len(), "field map loaded");
    Ok(fields)
}

/// Load an optional record document; `None` means no record exists yet.
pub fn load_optional_record(path: Option<&Path>) -> Result<Option<FieldMap>> {
    path.map(load_field_map).transpose()
}

/// Load params and an optional record for checking `properties`.
///
/// The record's field names are compared with `properties` before any value
/// is type checked, so a record missing a checked field is reported as such
/// even when the params also hold values of the wrong type.
pub fn load_inputs(
    properties: &[&str],
    params_path: &Path,
    record_path: Option<&Path>,
) -> Result<(FieldMap, Option<FieldMap>)> {
    let raw_record = record_path.map(load_json).transpose()?;
    if let (Some(Value::Object(object)), Some(path)) = (&raw_record, record_path) {
        ensure_subset(properties, object.keys().map(String::as_str))
            .with_context(|| format!("validate {}", path.display()))?;
    }

    let params = load_field_map(params_path)?;
    let record = match (raw_record, record_path) {
        (Some(value), Some(path)) => Some(
            FieldMap::from_json(&value).with_context(|| format!("validate {}", path.display()))?,
        ),
        _ => None,
    };
    debug!(
        properties = properties.len(),
        has_record = record.is_some(),
        "inputs loaded"
    );
    Ok((params, record))
}

/// Load `change_task_info` parameters, validated against the bundled schema.
pub fn load_task_info_params(path: &Path) -> Result<TaskInfoParams> {
    debug!(path = %path.display(), "loading change task info params");
    let value = load_json(path)?;
    let schema: Value =
        serde_json::from_str(CHANGE_TASK_INFO_SCHEMA).context("parse change_task_info schema")?;
    validate_schema(&schema, &value).with_context(|| format!("validate {}", path.display()))?;
    serde_json::from_value(value).with_context(|| format!("deserialize {}", path.display()))
}

fn validate_schema(schema: &Value, instance: &Value) -> Result<()> {
    let compiled = validator_for(schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(instance) {
        let messages = compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!("schema validation failed: {}", messages.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixtures;
    use serde_json::json;

    #[test]
    fn loads_field_map_with_nulls() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures
            .write_json("params.json", &json!({"state": "new", "assigned_to": null}))
            .expect("write");

        let fields = load_field_map(&path).expect("load");
        assert_eq!(fields.get("state"), Some("new"));
        assert_eq!(fields.get("assigned_to"), None);
    }

    /// The type violation surfaces with the offending name and type.
    #[test]
    fn field_map_rejects_wrong_value_type() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures
            .write_json("record.json", &json!({"a": null, "b": 12}))
            .expect("write");

        let err = load_field_map(&path).expect_err("number must fail");
        let message = format!("{:#}", err);
        assert!(message.contains("Expected 'b' to be text or None, got number"));
    }

    #[test]
    fn missing_record_path_means_no_record() {
        assert_eq!(load_optional_record(None).expect("load"), None);
    }

    #[test]
    fn missing_file_reports_path() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures.path().join("absent.json");
        let err = load_field_map(&path).expect_err("missing file");
        assert!(err.to_string().contains("absent.json"));
    }

    /// Record field names are compared before any value is type checked.
    #[test]
    fn load_inputs_reports_subset_before_wrong_types() {
        let fixtures = Fixtures::new().expect("fixtures");
        let params = fixtures
            .write_json("params.json", &json!({"a": 1, "b": 2}))
            .expect("params");
        let record = fixtures
            .write_json("record.json", &json!({"a": 1}))
            .expect("record");

        let err = load_inputs(&["a", "b"], &params, Some(&record)).expect_err("subset");
        assert!(format!("{:#}", err).contains("not a subset"));
    }

    #[test]
    fn load_inputs_still_type_checks_params() {
        let fixtures = Fixtures::new().expect("fixtures");
        let params = fixtures
            .write_json("params.json", &json!({"a": 1}))
            .expect("params");
        let record = fixtures
            .write_json("record.json", &json!({"a": "b"}))
            .expect("record");

        let err = load_inputs(&["a"], &params, Some(&record)).expect_err("wrong type");
        assert!(format!("{:#}", err).contains("Expected 'a' to be text or None, got number"));
    }

    #[test]
    fn load_inputs_accepts_empty_record() {
        let fixtures = Fixtures::new().expect("fixtures");
        let params = fixtures
            .write_json("params.json", &json!({"a": "b"}))
            .expect("params");
        let record = fixtures.write_json("record.json", &json!({})).expect("record");

        let (params, record) = load_inputs(&["a"], &params, Some(&record)).expect("load");
        assert_eq!(params.get("a"), Some("b"));
        assert_eq!(record, Some(FieldMap::new()));
    }

    #[test]
    fn loads_task_info_params() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures
            .write_json(
                "info.json",
                &json!({"query": [{"short_description": "LIKE SAP"}]}),
            )
            .expect("write");

        let params = load_task_info_params(&path).expect("load");
        assert_eq!(params.sys_id, None);
        let query = params.query.expect("query");
        assert_eq!(query[0]["short_description"], "LIKE SAP");
    }

    #[test]
    fn task_info_params_reject_unknown_keys() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures
            .write_json("info.json", &json!({"sys_id": "abc", "state": "new"}))
            .expect("write");

        let err = load_task_info_params(&path).expect_err("schema violation");
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }

    #[test]
    fn task_info_params_reject_non_text_conditions() {
        let fixtures = Fixtures::new().expect("fixtures");
        let path = fixtures
            .write_json("info.json", &json!({"query": [{"state": 3}]}))
            .expect("write");

        assert!(load_task_info_params(&path).is_err());
    }
}
