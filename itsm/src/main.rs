//! `itsm` command line.
//!
//! Checks requested ServiceNow record parameters against the record already
//! stored on the instance and builds table list queries. Results are printed
//! to stdout; the exit code reports the outcome (see [`itsm::exit_codes`]).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use itsm::change_task_info::list_request_from_file;
use itsm::core::validation::{check_value_incompatibility, missing_from_params_and_remote};
use itsm::exit_codes;
use itsm::io::documents::{load_field_map, load_inputs, load_optional_record};
use itsm::logging;
use itsm::reconcile::{ReconcileOutcome, reconcile_from_files};

#[derive(Parser)]
#[command(
    name = "itsm",
    version,
    about = "Reconcile ServiceNow ITSM parameters with existing records"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print required properties that have no value in params or record.
    Missing {
        /// Property that must have a value (repeatable).
        #[arg(long = "property", required = true)]
        properties: Vec<String>,
        /// JSON object with the requested parameters.
        #[arg(long)]
        params: PathBuf,
        /// JSON object with the existing record, if there is one.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Resolve a property's effective value and check it against disallowed values.
    CheckValue {
        #[arg(long)]
        property: String,
        /// Disallowed value (repeatable). Without any, every value is compatible.
        #[arg(long = "incompatible")]
        incompatible: Vec<String>,
        #[arg(long)]
        params: PathBuf,
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Apply a TOML policy and print the report as JSON.
    Reconcile {
        #[arg(long)]
        policy: PathBuf,
        #[arg(long)]
        params: PathBuf,
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Print the table list request for change request tasks as JSON.
    ChangeTaskQuery {
        #[arg(long)]
        params: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Missing {
            properties,
            params,
            record,
        } => cmd_missing(&properties, &params, record.as_deref()),
        Command::CheckValue {
            property,
            incompatible,
            params,
            record,
        } => cmd_check_value(&property, &incompatible, &params, record.as_deref()),
        Command::Reconcile {
            policy,
            params,
            record,
        } => cmd_reconcile(&policy, &params, record.as_deref()),
        Command::ChangeTaskQuery { params } => cmd_change_task_query(&params),
    }
}

fn cmd_missing(properties: &[String], params_path: &Path, record_path: Option<&Path>) -> Result<i32> {
    let names: Vec<&str> = properties.iter().map(String::as_str).collect();
    let (params, record) = load_inputs(&names, params_path, record_path)?;

    let missing = missing_from_params_and_remote(&names, &params, record.as_ref())?;
    debug!(checked = names.len(), missing = missing.len(), "missing check finished");
    for name in &missing {
        println!("{}", name);
    }

    if missing.is_empty() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::MISSING)
    }
}

fn cmd_check_value(
    property: &str,
    incompatible: &[String],
    params_path: &Path,
    record_path: Option<&Path>,
) -> Result<i32> {
    let params = load_field_map(params_path)?;
    let record = load_optional_record(record_path)?;
    let values: Vec<&str> = incompatible.iter().map(String::as_str).collect();

    let check = check_value_incompatibility(&values, property, &params, record.as_ref());
    print_json(&check)?;

    if check.compatible {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::INCOMPATIBLE)
    }
}

fn cmd_reconcile(policy_path: &Path, params_path: &Path, record_path: Option<&Path>) -> Result<i32> {
    let report = reconcile_from_files(policy_path, params_path, record_path)?;
    print_json(&report)?;

    Ok(match report.outcome() {
        ReconcileOutcome::Clean => exit_codes::OK,
        ReconcileOutcome::Missing => exit_codes::MISSING,
        ReconcileOutcome::Incompatible => exit_codes::INCOMPATIBLE,
    })
}

fn cmd_change_task_query(params_path: &Path) -> Result<i32> {
    let request = list_request_from_file(params_path)?;
    print_json(&request)?;
    Ok(exit_codes::OK)
}

/// Print `value` as a single line of JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string(value).context("serialize output")?;
    println!("{}", payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_missing_with_repeated_properties() {
        let cli = Cli::parse_from([
            "itsm",
            "missing",
            "--property",
            "a",
            "--property",
            "b",
            "--params",
            "params.json",
        ]);
        match cli.command {
            Command::Missing {
                properties, record, ..
            } => {
                assert_eq!(properties, vec!["a", "b"]);
                assert_eq!(record, None);
            }
            _ => panic!("expected missing command"),
        }
    }

    #[test]
    fn parse_check_value_without_incompatible_values() {
        let cli = Cli::parse_from([
            "itsm",
            "check-value",
            "--property",
            "state",
            "--params",
            "params.json",
        ]);
        match cli.command {
            Command::CheckValue { incompatible, .. } => assert!(incompatible.is_empty()),
            _ => panic!("expected check-value command"),
        }
    }

    #[test]
    fn parse_change_task_query() {
        let cli = Cli::parse_from(["itsm", "change-task-query", "--params", "info.json"]);
        assert!(matches!(cli.command, Command::ChangeTaskQuery { .. }));
    }
}
