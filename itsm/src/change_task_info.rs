//! List requests for change request tasks (`itsm change-task-query`).
//!
//! Builds the table name and query parameters used to list `change_task`
//! records: either an encoded `sysparm_query` or a plain `sys_id`/`number`
//! filter. Sending the request is left to the caller.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::query::{RawClause, parse_query, serialize_query};
use crate::io::documents::load_task_info_params;

/// Table holding change request tasks.
pub const TABLE: &str = "change_task";

/// Parameters accepted when listing change request tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskInfoParams {
    pub sys_id: Option<String>,
    pub number: Option<String>,
    /// OR-clauses of `column -> "OPERATOR value"` conditions, in written order.
    pub query: Option<Vec<Map<String, Value>>>,
}

/// Table and query parameters for a list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRequest {
    pub table: &'static str,
    pub query: BTreeMap<String, String>,
}

/// Build the list request for `params`.
///
/// `query` cannot be combined with `sys_id` or `number`, even when it is an
/// empty list. An empty query list adds no `sysparm_query`.
pub fn build_list_request(params: &TaskInfoParams) -> Result<ListRequest> {
    if let Some(raw_query) = &params.query {
        for (name, value) in [("sys_id", &params.sys_id), ("number", &params.number)] {
            if value.is_some() {
                bail!("parameters are mutually exclusive: {}|query", name);
            }
        }

        let mut query = BTreeMap::new();
        if !raw_query.is_empty() {
            let parsed = parse_query(&raw_clauses(raw_query)?)?;
            let encoded = serialize_query(&parsed);
            debug!(clauses = parsed.len(), sysparm_query = %encoded, "encoded query");
            query.insert("sysparm_query".to_string(), encoded);
        }
        return Ok(ListRequest {
            table: TABLE,
            query,
        });
    }

    let query = [("sys_id", &params.sys_id), ("number", &params.number)]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name.to_string(), value)))
        .collect();
    Ok(ListRequest {
        table: TABLE,
        query,
    })
}

fn raw_clauses(raw_query: &[Map<String, Value>]) -> Result<Vec<RawClause>> {
    raw_query
        .iter()
        .map(|clause| {
            clause
                .iter()
                .map(|(column, condition)| match condition {
                    Value::String(condition) => Ok((column.clone(), condition.clone())),
                    _ => bail!("query condition for '{}' must be text", column),
                })
                .collect::<Result<RawClause>>()
        })
        .collect()
}

/// Load parameters from disk and build the list request.
pub fn list_request_from_file(path: &Path) -> Result<ListRequest> {
    let params = load_task_info_params(path)?;
    build_list_request(&params)
}
