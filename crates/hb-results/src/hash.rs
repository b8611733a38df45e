//! Content-based hashing for run IDs.

use hb_case::CaseConfiguration;
use sha2::{Digest, Sha256};

/// SHA-256 over the merged case and the solver version.
///
/// Two runs share an id exactly when they would produce the same result, so
/// the id doubles as the cache key.
pub fn compute_run_id(case: &CaseConfiguration, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let case_json = serde_json::to_string(case).unwrap_or_default();
    hasher.update(case_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
