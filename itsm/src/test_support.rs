//! Test-only helpers for building field maps and on-disk fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::fields::FieldMap;

/// Build a field map from `(name, value)` pairs.
pub fn fields(entries: &[(&str, Option<&str>)]) -> FieldMap {
    entries
        .iter()
        .map(|(name, value)| (*name, *value))
        .collect()
}

/// Temporary directory holding JSON and TOML fixtures for a test.
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create fixture dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `value` as pretty JSON to `name` and return its path.
    pub fn write_json(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let mut payload = serde_json::to_string_pretty(value).context("serialize fixture")?;
        payload.push('\n');
        self.write(name, &payload)
    }

    /// Write raw `contents` to `name` and return its path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
