//! Case loading, validation, and introspection.

use hb_case::{CaseError, DeviceConfig, PreparedCase, expand_grid};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// What a case file declares, for `validate` output.
#[derive(Debug, Clone)]
pub struct CaseSummary {
    pub input_case: String,
    pub description: Option<String>,
    pub schema_version: Option<String>,
    pub devices: Vec<DeviceSummary>,
    pub axis_paths: Vec<String>,
    pub grid_points: usize,
}

#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub id: String,
    pub kind: String,
    pub hooks: Vec<String>,
}

/// Load, merge and validate a case file.
pub fn load_case(path: &Path) -> AppResult<PreparedCase> {
    hb_case::load_case(path).map_err(|err| match err {
        CaseError::Io(source) => AppError::CaseFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Case file name as recorded in results.
pub fn case_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn summarize_case(prepared: &PreparedCase) -> CaseSummary {
    let config = &prepared.config;
    CaseSummary {
        input_case: config.meta.input_case.clone().unwrap_or_default(),
        description: config.meta.description.clone(),
        schema_version: config.meta.case_schema_version.clone(),
        devices: config.devices.iter().map(summarize_device).collect(),
        axis_paths: prepared.axes.iter().map(|a| a.path.clone()).collect(),
        grid_points: if prepared.axes.is_empty() {
            0
        } else {
            expand_grid(&prepared.axes).len()
        },
    }
}

fn summarize_device(device: &DeviceConfig) -> DeviceSummary {
    DeviceSummary {
        id: device.id().to_string(),
        kind: device.kind_name().to_string(),
        hooks: device
            .active_hooks()
            .iter()
            .map(|hook| hook.as_str().to_string())
            .collect(),
    }
}

/// Load and validate a case file, returning its summary.
pub fn validate_case_file(path: &Path) -> AppResult<CaseSummary> {
    let prepared = load_case(path)?;
    Ok(summarize_case(&prepared))
}
