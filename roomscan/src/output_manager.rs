//! Output path generation and sidecar writing for one input image.
//!
//! Auxiliary outputs are always named `<stem>_<suffix>.<ext>`, placed in the
//! output directory when one is configured and next to the input otherwise.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::config::ProcessorConfig;
use crate::metadata::{get_metadata_path, load_or_create_metadata, save_metadata, ToolSections};

pub struct OutputManager<'a> {
    config: &'a dyn ProcessorConfig,
    input_path: &'a Path,
}

impl<'a> OutputManager<'a> {
    pub fn new(config: &'a dyn ProcessorConfig, input_path: &'a Path) -> Self {
        Self { config, input_path }
    }

    fn input_stem(&self) -> &str {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
    }

    fn output_dir(&self) -> Option<&str> {
        self.config.base().output_dir.as_deref()
    }

    /// Path for a derived file such as `room_zones.png`; creates the output
    /// directory if needed
    pub fn generate_auxiliary_output(&self, suffix: &str, extension: &str) -> Result<PathBuf> {
        let filename = format!("{}_{suffix}.{extension}", self.input_stem());

        match self.output_dir() {
            Some(dir) => {
                let dir = Path::new(dir);
                std::fs::create_dir_all(dir)?;
                Ok(dir.join(filename))
            }
            None => Ok(self
                .input_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(filename)),
        }
    }

    /// Path as recorded in the sidecar, relative to it where possible
    pub fn make_relative_to_metadata(&self, path: &Path) -> Result<String> {
        if self.config.base().skip_metadata {
            return Ok(path.to_string_lossy().to_string());
        }
        let metadata_path = get_metadata_path(self.input_path, self.output_dir())?;
        Ok(make_path_relative_to_toml(path, &metadata_path))
    }

    /// Merge this tool's section into the sidecar, keeping other tools' sections
    pub fn save_tool_metadata(&self, sections: ToolSections) -> Result<()> {
        if self.config.base().skip_metadata {
            return Ok(());
        }

        let metadata_path = get_metadata_path(self.input_path, self.output_dir())?;
        let mut metadata = load_or_create_metadata(&metadata_path)?;

        match self.config.tool_name() {
            "check" => metadata.check = Some(sections),
            "analyze" => metadata.analyze = Some(sections),
            other => return Err(anyhow::anyhow!("Unknown tool name: {other}")),
        }

        save_metadata(&metadata, &metadata_path)?;
        debug!("Saved metadata to {}", metadata_path.display());
        Ok(())
    }
}

/// Forward-slash relative path when `file_path` sits under the TOML's
/// directory, the full path otherwise
pub fn make_path_relative_to_toml(file_path: &Path, toml_path: &Path) -> String {
    toml_path
        .parent()
        .and_then(|dir| file_path.strip_prefix(dir).ok())
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|| file_path.to_string_lossy().to_string())
}
