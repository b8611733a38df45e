//! Built-in defaults and the non-destructive merge that layers a case on top.

use crate::CaseResult;
use serde_json::{Map, Value};

const DEFAULTS_JSON: &str = include_str!("../defaults/defaults.json");

/// Built-in defaults as a JSON tree.
pub fn builtin_defaults() -> CaseResult<Value> {
    Ok(serde_json::from_str(DEFAULTS_JSON)?)
}

/// Recursively merge `overlay` onto `base`, returning a new tree.
///
/// Objects merge key by key; any other overlay value (arrays included)
/// replaces the base value wholesale. Neither input is modified.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in overlay_map {
                let next = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Layer a case over the built-in defaults.
pub fn merge_with_defaults(case: &Value) -> CaseResult<Value> {
    Ok(deep_merge(&builtin_defaults()?, case))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_parse() {
        let defaults = builtin_defaults().unwrap();
        assert_eq!(defaults["hrsg"]["stack_temp_min_C"], json!(90.0));
        assert_eq!(defaults["condenser"]["vacuum_kPa_abs"], json!(8.0));
    }

    #[test]
    fn overlay_wins_and_siblings_survive() {
        let base = json!({"hrsg": {"hp": {"pressure_bar": 120.0, "pinch_K": 10.0}}});
        let overlay = json!({"hrsg": {"hp": {"pinch_K": 8.0}}});
        let merged = deep_merge(&base, &overlay);
        assert_eq!(merged["hrsg"]["hp"]["pinch_K"], json!(8.0));
        assert_eq!(merged["hrsg"]["hp"]["pressure_bar"], json!(120.0));
        assert_eq!(base["hrsg"]["hp"]["pinch_K"], json!(10.0));
    }

    #[test]
    fn arrays_replace_wholesale() {
        let base = json!({"devices": [{"id": "a"}]});
        let overlay = json!({"devices": []});
        assert_eq!(deep_merge(&base, &overlay)["devices"], json!([]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn merge_with_empty_overlay_is_identity(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let base = json!({"x": a, "nested": {"y": b}});
            prop_assert_eq!(deep_merge(&base, &json!({})), base);
        }

        #[test]
        fn overlay_leaf_always_wins(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let base = json!({"nested": {"y": a, "z": 1.0}});
            let overlay = json!({"nested": {"y": b}});
            let merged = deep_merge(&base, &overlay);
            prop_assert_eq!(&merged["nested"]["y"], &json!(b));
            prop_assert_eq!(&merged["nested"]["z"], &json!(1.0));
        }
    }
}
