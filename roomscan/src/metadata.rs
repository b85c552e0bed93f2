use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::color_utils::{colors, symbols};

/// Contents of one `<stem>.roomscan.toml` sidecar
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct RoomscanMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<ToolSections>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze: Option<ToolSections>,
}

/// Everything one subcommand records about an image
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ToolSections {
    // Tool results sit directly in the section table
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub core: Option<toml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<toml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputProcessing>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExecutionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roomscan_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roomscan_env_vars: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct InputProcessing {
    pub image_path: String,
    pub source: String,
    pub source_type: String,
    pub strict_mode: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_files: Vec<String>,
}

/// Existing sidecar, or an empty one if absent. Unparsable files are dropped.
pub fn load_or_create_metadata(path: &Path) -> Result<RoomscanMetadata> {
    if !path.exists() {
        return Ok(RoomscanMetadata::default());
    }

    let content = fs::read_to_string(path)?;
    match toml::from_str::<RoomscanMetadata>(&content) {
        Ok(metadata) => Ok(metadata),
        Err(e) => {
            warn!(
                "{}Dropping existing metadata from {}:\n{}",
                symbols::warning(),
                path.display(),
                colors::warning_level(&e.to_string())
            );
            Ok(RoomscanMetadata::default())
        }
    }
}

pub fn save_metadata(metadata: &RoomscanMetadata, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(metadata).map_err(|e| {
        log::debug!("Metadata that failed to serialize: {metadata:#?}");
        anyhow!("Failed to serialize metadata to TOML: {e}")
    })?;

    fs::write(path, content)?;
    Ok(())
}

/// `<stem>.roomscan.toml` in `output_dir`, or next to the input
pub fn get_metadata_path(input_path: &Path, output_dir: Option<&str>) -> Result<PathBuf> {
    let input_stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid input filename: {}", input_path.display()))?;

    let filename = format!("{input_stem}.roomscan.toml");
    Ok(match output_dir {
        Some(dir) => Path::new(dir).join(filename),
        None => input_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(filename),
    })
}

/// Non-empty `ROOMSCAN_*` variables, sorted by name
pub fn collect_roomscan_env_vars() -> Option<BTreeMap<String, String>> {
    let vars: BTreeMap<String, String> = std::env::vars()
        .filter(|(key, value)| key.starts_with("ROOMSCAN_") && !value.is_empty())
        .collect();

    if vars.is_empty() {
        None
    } else {
        Some(vars)
    }
}
