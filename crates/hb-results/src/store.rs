//! Run storage API.
//!
//! Layout: `<root>/<run_id>/{manifest,result,trace,case}.json`.

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};
use hb_case::CaseConfiguration;
use hb_solver::{PipelineArtifacts, PipelineTrace, PlantResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";
const RESULT_FILE: &str = "result.json";
const TRACE_FILE: &str = "trace.json";
const CASE_FILE: &str = "case.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store beside a case file: `<case dir>/.heatbal/runs`.
    pub fn for_case(case_path: &Path) -> ResultsResult<Self> {
        let case_dir = case_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "case path has no parent directory".to_string(),
            })?;
        Self::new(case_dir.join(".heatbal").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        let dir = self.run_dir(run_id);
        dir.join(MANIFEST_FILE).exists() && dir.join(RESULT_FILE).exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        artifacts: &PipelineArtifacts,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        write_json(&run_dir.join(RESULT_FILE), &artifacts.result)?;
        write_json(&run_dir.join(TRACE_FILE), &artifacts.trace)?;
        write_json(&run_dir.join(CASE_FILE), &artifacts.merged_case)?;
        // Manifest last: its presence marks a complete run.
        write_json(&run_dir.join(MANIFEST_FILE), manifest)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        self.load(run_id, MANIFEST_FILE)
    }

    pub fn load_result(&self, run_id: &str) -> ResultsResult<PlantResult> {
        self.load(run_id, RESULT_FILE)
    }

    pub fn load_trace(&self, run_id: &str) -> ResultsResult<PipelineTrace> {
        self.load(run_id, TRACE_FILE)
    }

    pub fn load_case(&self, run_id: &str) -> ResultsResult<CaseConfiguration> {
        self.load(run_id, CASE_FILE)
    }

    fn load<T: DeserializeOwned>(&self, run_id: &str, file: &str) -> ResultsResult<T> {
        let path = self.run_dir(run_id).join(file);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Manifests of stored runs, optionally only those made from `case_name`.
    pub fn list_runs(&self, case_name: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && case_name.is_none_or(|name| manifest.case_name == name)
                {
                    runs.push(manifest);
                }
            }
        }

        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ResultsResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
