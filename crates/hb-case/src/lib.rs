//! hb-case: case file format, defaults, layout migration and validation.

pub mod batch;
pub mod defaults;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use batch::{BatchAxis, GridPoint, case_at_point, expand_grid};
pub use defaults::{builtin_defaults, deep_merge, merge_with_defaults};
pub use migrate::{LATEST_SCHEMA_VERSION, NormalizedCase, normalize_layout};
pub use schema::*;
pub use validate::{ValidationError, validate_case};

use serde_json::Value;
use std::path::Path;

pub type CaseResult<T> = Result<T, CaseError>;

#[derive(thiserror::Error, Debug)]
pub enum CaseError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A case ready to run: typed configuration, the merged JSON tree it was
/// built from, and any batch axes the file declared.
#[derive(Debug, Clone)]
pub struct PreparedCase {
    pub config: CaseConfiguration,
    pub merged: Value,
    pub axes: Vec<BatchAxis>,
}

/// Normalize, merge defaults, deserialize and validate a raw case tree.
pub fn prepare_case(raw: Value, input_case: &str) -> CaseResult<PreparedCase> {
    let normalized = normalize_layout(raw, input_case)?;
    let merged = merge_with_defaults(&normalized.case)?;
    let config: CaseConfiguration = serde_json::from_value(merged.clone())?;
    validate_case(&config)?;
    Ok(PreparedCase {
        config,
        merged,
        axes: normalized.axes,
    })
}

/// Read a case file; `.yaml`/`.yml` as YAML, anything else as JSON.
pub fn read_raw(path: &Path) -> CaseResult<Value> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

pub fn load_case(path: &Path) -> CaseResult<PreparedCase> {
    let raw = read_raw(path)?;
    let input_case = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    prepare_case(raw, &input_case)
}
