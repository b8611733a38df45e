//! Parameter grids over a merged case.

use crate::schema::CaseConfiguration;
use crate::validate::validate_case;
use crate::{CaseError, CaseResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One varied parameter: a dotted path into the merged case and its values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchAxis {
    pub path: String,
    pub values: Vec<f64>,
}

/// Assignment of one value per axis.
pub type GridPoint = Vec<(String, f64)>;

/// Cartesian product of the axes; the first axis varies slowest.
pub fn expand_grid(axes: &[BatchAxis]) -> Vec<GridPoint> {
    axes.iter().fold(vec![Vec::new()], |points, axis| {
        points
            .iter()
            .flat_map(|prefix| {
                axis.values.iter().map(move |&value| {
                    let mut point = prefix.clone();
                    point.push((axis.path.clone(), value));
                    point
                })
            })
            .collect()
    })
}

/// Write `value` at a dotted `path`. Intermediate objects must exist.
pub fn set_path(case: &mut Value, path: &str, value: f64) -> CaseResult<()> {
    let mut segments = path.split('.').peekable();
    let mut cursor = case;
    while let Some(segment) = segments.next() {
        let Value::Object(map) = cursor else {
            return Err(CaseError::Migration {
                what: format!("vary path {path}: `{segment}` is not inside an object"),
            });
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), Value::from(value));
            return Ok(());
        }
        cursor = map.get_mut(segment).ok_or_else(|| CaseError::Migration {
            what: format!("vary path {path}: unknown group `{segment}`"),
        })?;
    }
    Err(CaseError::Migration {
        what: "empty vary path".to_string(),
    })
}

/// Merged case with a grid point applied, re-validated.
pub fn case_at_point(merged: &Value, point: &GridPoint) -> CaseResult<(CaseConfiguration, Value)> {
    let mut case = merged.clone();
    for (path, value) in point {
        set_path(&mut case, path, *value)?;
    }
    let config: CaseConfiguration = serde_json::from_value(case.clone())?;
    validate_case(&config)?;
    Ok((config, case))
}
