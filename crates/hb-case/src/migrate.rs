//! Case layout normalization.
//!
//! Two on-disk layouts exist:
//! - flat (schema 0.2): subsystem groups at the top level, optional `vary`;
//! - fixed (schema 0.3): subsystem groups under `fixed`, with `devices`,
//!   `constraints`, `vary`, `schema_version` and `units_system` beside it.
//!
//! Both normalize to the flat layout consumed by [`crate::schema`].

use crate::batch::BatchAxis;
use crate::{CaseError, CaseResult};
use serde_json::{Map, Value};

pub const LATEST_SCHEMA_VERSION: &str = "0.3";
const FLAT_SCHEMA_VERSION: &str = "0.2";
const SUPPORTED_UNITS: &str = "SI_IF97";

/// A case in flat layout plus the batch axes it declared.
#[derive(Debug, Clone)]
pub struct NormalizedCase {
    pub case: Value,
    pub axes: Vec<BatchAxis>,
}

pub fn normalize_layout(raw: Value, input_case: &str) -> CaseResult<NormalizedCase> {
    let Value::Object(mut root) = raw else {
        return Err(CaseError::Migration {
            what: "case root must be an object".to_string(),
        });
    };

    let axes = match root.remove("vary") {
        Some(vary) => parse_axes(&vary)?,
        None => Vec::new(),
    };

    let mut case = if root.contains_key("fixed") {
        migrate_fixed_layout(root)?
    } else {
        root
    };

    let meta = case
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(meta) = meta else {
        return Err(CaseError::Migration {
            what: "meta must be an object".to_string(),
        });
    };
    meta.entry("input_case")
        .or_insert_with(|| Value::String(input_case.to_string()));
    meta.entry("case_schema_version")
        .or_insert_with(|| Value::String(FLAT_SCHEMA_VERSION.to_string()));

    Ok(NormalizedCase {
        case: Value::Object(case),
        axes,
    })
}

fn migrate_fixed_layout(mut root: Map<String, Value>) -> CaseResult<Map<String, Value>> {
    let version = root
        .remove("schema_version")
        .or_else(|| root.remove("version"))
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| LATEST_SCHEMA_VERSION.to_string());
    if version_key(&version) > version_key(LATEST_SCHEMA_VERSION) {
        return Err(CaseError::Migration {
            what: format!("unsupported case schema version {version}"),
        });
    }

    if let Some(units) = root.remove("units_system")
        && units.as_str() != Some(SUPPORTED_UNITS)
    {
        return Err(CaseError::Migration {
            what: format!("unsupported units system {units}"),
        });
    }

    let Some(Value::Object(mut fixed)) = root.remove("fixed") else {
        return Err(CaseError::Migration {
            what: "`fixed` must be an object".to_string(),
        });
    };

    for key in ["devices", "constraints", "vendor_curves"] {
        if let Some(value) = root.remove(key) {
            fixed.insert(key.to_string(), value);
        }
    }

    let mut meta = match root.remove("meta") {
        Some(Value::Object(meta)) => meta,
        _ => Map::new(),
    };
    meta.entry("case_schema_version")
        .or_insert_with(|| Value::String(version));
    fixed.insert("meta".to_string(), Value::Object(meta));

    Ok(fixed)
}

fn version_key(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map(|part| part.trim().parse().unwrap_or(u32::MAX))
        .collect()
}

/// `vary` maps a dotted config path to either a list of values or a
/// `{start, stop, step}` range.
fn parse_axes(vary: &Value) -> CaseResult<Vec<BatchAxis>> {
    let Value::Object(entries) = vary else {
        return Err(CaseError::Migration {
            what: "`vary` must map config paths to values".to_string(),
        });
    };

    entries
        .iter()
        .map(|(path, spec)| {
            let values = match spec {
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_f64().ok_or_else(|| CaseError::Migration {
                            what: format!("vary axis {path}: non-numeric value {item}"),
                        })
                    })
                    .collect::<CaseResult<Vec<f64>>>()?,
                Value::Object(range) => range_values(path, range)?,
                other => {
                    return Err(CaseError::Migration {
                        what: format!("vary axis {path}: unsupported spec {other}"),
                    });
                }
            };
            Ok(BatchAxis {
                path: path.clone(),
                values,
            })
        })
        .collect()
}

fn range_values(path: &str, range: &Map<String, Value>) -> CaseResult<Vec<f64>> {
    let field = |name: &str| {
        range
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| CaseError::Migration {
                what: format!("vary axis {path}: range needs numeric `{name}`"),
            })
    };
    let (start, stop, step) = (field("start")?, field("stop")?, field("step")?);
    if step <= 0.0 || stop < start {
        return Err(CaseError::Migration {
            what: format!("vary axis {path}: empty range"),
        });
    }
    let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
    Ok((0..count).map(|i| start + step * i as f64).collect())
}
