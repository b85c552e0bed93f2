//! CLI argument structs and the internal configurations built from them.
//!
//! Clap types stay at the edge: `GlobalArgs` and the per-command structs are
//! converted into `BaseConfig`, `CheckConfig` and `AnalyzeConfig`, which is
//! what the processing layer and metadata see.

use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use serde::Serialize;
use std::path::PathBuf;

use crate::params::{AnalysisParams, GateParams};

/// Arguments accepted by every subcommand
#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Write outputs here instead of next to each input
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Write a `<stem>.roomscan.toml` sidecar for each image
    #[arg(long, global = true)]
    pub metadata: bool,

    /// Verbosity level (-q/--quiet, -v/-vv/-vvv for info/debug/trace)
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Warn and skip unusable inputs instead of failing
    #[arg(long, global = true)]
    pub permissive: bool,

    /// Disable colored output (also respects NO_COLOR and ROOMSCAN_NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Options shared by all processors
#[derive(Debug, Clone, Serialize)]
pub struct BaseConfig {
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    pub skip_metadata: bool,
    /// Opposite of `--permissive`
    pub strict: bool,
}

impl From<GlobalArgs> for BaseConfig {
    fn from(global: GlobalArgs) -> Self {
        Self {
            sources: Vec::new(),
            output_dir: global.output_dir,
            skip_metadata: !global.metadata,
            strict: !global.permissive,
        }
    }
}

/// Run only the quality gate
#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    /// Images, directories, or glob patterns such as rooms/*.jpg
    #[arg(value_name = "IMAGES_OR_DIRS", required = true)]
    pub sources: Vec<String>,

    /// TOML file overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,
}

/// Gate each image, then analyze the accepted ones
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeCommand {
    /// Images, directories, or glob patterns such as rooms/*.jpg
    #[arg(value_name = "IMAGES_OR_DIRS", required = true)]
    pub sources: Vec<String>,

    /// TOML file overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Save a copy of each accepted image with furniture zones outlined
    #[arg(long)]
    pub layout_zones: bool,

    /// Save every edge map computed during analysis as a PNG
    #[arg(long)]
    pub debug_dump_images: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckConfig {
    #[serde(skip)]
    pub base: BaseConfig,
    pub gate: GateParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeConfig {
    #[serde(skip)]
    pub base: BaseConfig,
    pub layout_zones: bool,
    pub debug_dump_images: bool,
    pub params: AnalysisParams,
}

fn load_params(path: Option<&PathBuf>) -> Result<AnalysisParams> {
    match path {
        Some(path) => Ok(AnalysisParams::from_toml_file(path)?),
        None => Ok(AnalysisParams::default()),
    }
}

impl CheckConfig {
    pub fn from_args(global: GlobalArgs, cmd: CheckCommand) -> Result<Self> {
        let mut base: BaseConfig = global.into();
        base.sources = cmd.sources;
        let gate = load_params(cmd.params.as_ref())?.gate;
        Ok(Self { base, gate })
    }
}

impl AnalyzeConfig {
    pub fn from_args(global: GlobalArgs, cmd: AnalyzeCommand) -> Result<Self> {
        let mut base: BaseConfig = global.into();
        base.sources = cmd.sources;
        Ok(Self {
            base,
            layout_zones: cmd.layout_zones,
            debug_dump_images: cmd.debug_dump_images,
            params: load_params(cmd.params.as_ref())?,
        })
    }
}

/// Access to the shared part of a processor configuration
pub trait ProcessorConfig {
    fn base(&self) -> &BaseConfig;

    /// Metadata section name
    fn tool_name(&self) -> &'static str;
}

impl ProcessorConfig for CheckConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn tool_name(&self) -> &'static str {
        "check"
    }
}

impl ProcessorConfig for AnalyzeConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn tool_name(&self) -> &'static str {
        "analyze"
    }
}
