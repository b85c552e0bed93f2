//! Batch processing framework shared by the `check` and `analyze` commands.
//!
//! `RoomProcessor` is the per-image seam: each subcommand supplies how one
//! image is handled, and `run_processing` does input collection, progress,
//! strict/permissive error handling, and sidecar metadata around it.

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::{analyze_detailed, RoomAssessment};
use crate::color_utils::{colors, progress::create_batch_progress_bar, symbols};
use crate::config::{AnalyzeConfig, CheckConfig, ProcessorConfig};
use crate::error::AnalysisError;
use crate::image_input::{collect_images_from_sources, InputMode, SourceKind};
use crate::image_loader::{self, PixelGrid};
use crate::layout_zones::{draw_layout_zones, visible_zones};
use crate::metadata::{collect_roomscan_env_vars, ExecutionContext, InputProcessing, ToolSections};
use crate::output_manager::OutputManager;
use crate::progress::{print_suspended, remove_progress_bar};
use crate::quality_gate::{self, GateReport, GateVerdict};

/// Message shown for any photo the gate turns away
pub const INVALID_IMAGE_MESSAGE: &str =
    "Invalid image: Please upload a clear photo of an indoor room.";

/// Output of one processed image
pub trait ProcessResult {
    fn processing_time_ms(&self) -> f64;

    /// One-line summary for debug logging
    fn result_summary(&self) -> String;

    /// Text for stdout
    fn user_output(&self) -> String;

    /// Results recorded directly in the tool's metadata section
    fn core_results(&self) -> Result<toml::Value>;

    fn output_files(&self) -> &[PathBuf] {
        &[]
    }
}

pub trait RoomProcessor {
    type Config: ProcessorConfig + Serialize;
    type Result: ProcessResult;

    fn process_single_image(
        image_path: &Path,
        config: &Self::Config,
        output_manager: &OutputManager,
    ) -> Result<Self::Result>;
}

/// Gate outcome for one image; decode failures count as invalid
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    #[serde(skip)]
    pub image_path: PathBuf,
    #[serde(skip)]
    pub processing_time_ms: f64,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateReport>,
}

impl CheckResult {
    fn from_load(
        image_path: &Path,
        loaded: std::result::Result<PixelGrid, AnalysisError>,
        params: &crate::params::GateParams,
    ) -> Result<(Self, Option<PixelGrid>)> {
        let grid = match loaded {
            Ok(grid) => grid,
            Err(e) if e.is_decode() => {
                debug!("{}: {e}", image_path.display());
                let result = Self {
                    image_path: image_path.to_path_buf(),
                    processing_time_ms: 0.0,
                    valid: false,
                    decode_error: Some(e.to_string()),
                    gate: None,
                };
                return Ok((result, None));
            }
            Err(e) => return Err(e.into()),
        };

        let report = quality_gate::evaluate(&grid, params);
        let result = Self {
            image_path: image_path.to_path_buf(),
            processing_time_ms: 0.0,
            valid: report.verdict.is_accepted(),
            decode_error: None,
            gate: Some(report),
        };
        Ok((result, Some(grid)))
    }

    fn reason(&self) -> String {
        match (&self.decode_error, &self.gate) {
            (Some(e), _) => e.clone(),
            (None, Some(GateReport {
                verdict: GateVerdict::Rejected(reason),
                ..
            })) => reason.describe().to_string(),
            _ => String::new(),
        }
    }
}

impl ProcessResult for CheckResult {
    fn processing_time_ms(&self) -> f64 {
        self.processing_time_ms
    }

    fn result_summary(&self) -> String {
        match &self.gate {
            Some(report) => format!(
                "valid={} laplacian={:?} edge_ratio={:?} lines={:?}",
                self.valid, report.laplacian_variance, report.edge_ratio, report.line_count
            ),
            None => format!("valid=false ({})", self.reason()),
        }
    }

    fn user_output(&self) -> String {
        if self.valid {
            format!(
                "{}{}: {}\n",
                symbols::image_accepted(),
                self.image_path.display(),
                colors::verdict("valid", true)
            )
        } else {
            format!(
                "{}{}: {} ({})\n",
                symbols::image_rejected(),
                self.image_path.display(),
                colors::verdict("invalid", false),
                self.reason()
            )
        }
    }

    fn core_results(&self) -> Result<toml::Value> {
        Ok(toml::Value::try_from(self)?)
    }
}

pub struct CheckProcessor;

impl RoomProcessor for CheckProcessor {
    type Config = CheckConfig;
    type Result = CheckResult;

    fn process_single_image(
        image_path: &Path,
        config: &Self::Config,
        _output_manager: &OutputManager,
    ) -> Result<Self::Result> {
        let start = Instant::now();
        let (mut result, _) =
            CheckResult::from_load(image_path, image_loader::load(image_path), &config.gate)?;
        result.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(result)
    }
}

/// Gate outcome plus the assessment of accepted images
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResult {
    #[serde(flatten)]
    pub check: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RoomAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_density: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_brightness: Option<f64>,
    #[serde(skip)]
    pub output_files: Vec<PathBuf>,
}

impl ProcessResult for AnalyzeResult {
    fn processing_time_ms(&self) -> f64 {
        self.check.processing_time_ms
    }

    fn result_summary(&self) -> String {
        match &self.assessment {
            Some(a) => format!(
                "{} | free space {} | lighting {} | {} elements",
                a.room_state,
                a.free_space,
                a.lighting,
                a.elements.len()
            ),
            None => self.check.result_summary(),
        }
    }

    fn user_output(&self) -> String {
        match &self.assessment {
            Some(a) => a.report(),
            None => format!("{INVALID_IMAGE_MESSAGE}\n"),
        }
    }

    fn core_results(&self) -> Result<toml::Value> {
        Ok(toml::Value::try_from(self)?)
    }

    fn output_files(&self) -> &[PathBuf] {
        &self.output_files
    }
}

pub struct AnalyzeProcessor;

impl AnalyzeProcessor {
    fn write_outputs(
        grid: &PixelGrid,
        edge_maps: &[crate::edges::EdgeMap],
        config: &AnalyzeConfig,
        output_manager: &OutputManager,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if config.layout_zones {
            let path = output_manager.generate_auxiliary_output("zones", "png")?;
            draw_layout_zones(grid).save(&path)?;
            let drawn: Vec<_> = visible_zones(grid.width(), grid.height())
                .iter()
                .map(|z| z.label())
                .collect();
            debug!("Layout zones [{}] saved to {}", drawn.join(", "), path.display());
            written.push(path);
        }

        if config.debug_dump_images {
            for map in edge_maps {
                let path = output_manager
                    .generate_auxiliary_output(&format!("edges_{}", map.thresholds()), "png")?;
                map.to_image().save(&path)?;
                debug!("Edge map saved to {}", path.display());
                written.push(path);
            }
        }

        Ok(written)
    }
}

impl RoomProcessor for AnalyzeProcessor {
    type Config = AnalyzeConfig;
    type Result = AnalyzeResult;

    fn process_single_image(
        image_path: &Path,
        config: &Self::Config,
        output_manager: &OutputManager,
    ) -> Result<Self::Result> {
        let start = Instant::now();
        let (check, grid) =
            CheckResult::from_load(image_path, image_loader::load(image_path), &config.params.gate)?;

        let mut result = AnalyzeResult {
            check,
            assessment: None,
            edge_density: None,
            mean_brightness: None,
            output_files: Vec::new(),
        };

        if let (true, Some(grid)) = (result.check.valid, grid) {
            let output = analyze_detailed(&grid, &config.params);
            result.output_files =
                Self::write_outputs(&grid, &output.edge_maps, config, output_manager)?;
            result.edge_density = Some(output.edge_density);
            result.mean_brightness = Some(output.brightness);
            result.assessment = Some(output.assessment);
        }

        result.check.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(result)
    }
}

/// Everything about the run that is recorded alongside each image
struct RunContext {
    command_line: Vec<String>,
    strict: bool,
}

/// Process every input and return how many images were handled successfully
pub fn run_processing<P: RoomProcessor>(config: P::Config) -> Result<usize> {
    let run_start = Instant::now();
    let base = config.base();
    let context = RunContext {
        command_line: std::env::args().collect(),
        strict: base.strict,
    };

    let image_files =
        collect_images_from_sources(&base.sources, InputMode::from_strict_flag(base.strict))?;
    if image_files.is_empty() {
        warn!("{}No valid images found to process", symbols::warning());
        return Ok(0);
    }
    info!(
        "{}Found {} image(s) to process",
        symbols::resources_found(),
        image_files.len()
    );

    let progress_bar = create_batch_progress_bar(image_files.len());
    let mut successful_count = 0;
    let mut failed_count = 0;

    for (index, image_path) in image_files.iter().enumerate() {
        if let Some(pb) = &progress_bar {
            pb.set_message(image_path.display().to_string());
        }

        let output_manager = OutputManager::new(&config, image_path);
        let outcome = P::process_single_image(image_path, &config, &output_manager)
            .and_then(|result| {
                save_metadata_for_file::<P>(&result, &config, image_path, &context)?;
                Ok(result)
            });

        match outcome {
            Ok(result) => {
                successful_count += 1;
                if image_files.len() > 1 {
                    print_suspended(&format!("== {} ==\n", image_path.display()));
                }
                print_suspended(&result.user_output());
                info!(
                    "{}Processed {} ({}/{}) in {:.1}ms",
                    symbols::completed_successfully(),
                    image_path.display(),
                    index + 1,
                    image_files.len(),
                    result.processing_time_ms()
                );
                debug!("{}", result.result_summary());
            }
            Err(e) => {
                failed_count += 1;
                if context.strict {
                    if let Some(pb) = &progress_bar {
                        remove_progress_bar(pb);
                    }
                    return Err(e.context(format!("Failed to process {}", image_path.display())));
                }
                warn!(
                    "{}Failed to process {} ({}/{}): {e:#}",
                    symbols::warning(),
                    image_path.display(),
                    index + 1,
                    image_files.len()
                );
            }
        }

        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
        remove_progress_bar(pb);
    }

    let total_time = run_start.elapsed();
    if failed_count == 0 {
        info!(
            "{}Processed {} image(s) in {:.1}s",
            symbols::completed_successfully(),
            successful_count,
            total_time.as_secs_f64()
        );
    } else {
        warn!(
            "{}{} of {} image(s) failed to process",
            symbols::completed_partially_successfully(),
            failed_count,
            image_files.len()
        );
    }

    Ok(successful_count)
}

fn save_metadata_for_file<P: RoomProcessor>(
    result: &P::Result,
    config: &P::Config,
    image_path: &Path,
    context: &RunContext,
) -> Result<()> {
    let base = config.base();
    if base.skip_metadata {
        return Ok(());
    }
    let output_manager = OutputManager::new(config, image_path);

    let source = matching_source(&base.sources, image_path);
    let output_files = result
        .output_files()
        .iter()
        .map(|p| output_manager.make_relative_to_metadata(p))
        .collect::<Result<Vec<_>>>()?;

    let sections = ToolSections {
        core: Some(result.core_results()?),
        config: Some(toml::Value::try_from(config)?),
        execution: Some(ExecutionContext {
            timestamp: Some(Utc::now()),
            roomscan_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            command_line: Some(context.command_line.clone()),
            exit_code: Some(0),
            processing_time_ms: Some(result.processing_time_ms()),
            roomscan_env_vars: collect_roomscan_env_vars(),
        }),
        input: Some(InputProcessing {
            image_path: image_path.to_string_lossy().to_string(),
            source: source.to_string(),
            source_type: SourceKind::classify(source).as_str().to_string(),
            strict_mode: context.strict,
            output_files,
        }),
    };

    output_manager.save_tool_metadata(sections)
}

/// The source argument that produced `image_path`, falling back to the path itself
fn matching_source<'a>(sources: &'a [String], image_path: &'a Path) -> &'a str {
    sources
        .iter()
        .find(|source| {
            let source_path = Path::new(source.as_str());
            source_path == image_path
                || (source_path.is_dir() && image_path.parent() == Some(source_path))
                || glob::Pattern::new(source)
                    .map(|p| p.matches_path(image_path))
                    .unwrap_or(false)
        })
        .map(String::as_str)
        .unwrap_or_else(|| image_path.to_str().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseConfig;
    use crate::params::{AnalysisParams, GateParams};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn base(dir: &Path, metadata: bool) -> BaseConfig {
        BaseConfig {
            sources: vec![dir.to_string_lossy().to_string()],
            output_dir: None,
            skip_metadata: !metadata,
            strict: true,
        }
    }

    fn room_like(path: &Path) {
        RgbImage::from_fn(400, 300, |x, y| {
            let tone = if (x / 40) % 2 == 0 { 60 } else { 200 };
            let v = if y > 200 { tone / 2 } else { tone };
            Rgb([v, v, v])
        })
        .save(path)
        .unwrap();
    }

    #[test]
    fn test_check_processor_marks_invalid_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"nope").unwrap();
        RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]))
            .save(dir.path().join("tiny.png"))
            .unwrap();

        let config = CheckConfig {
            base: base(dir.path(), false),
            gate: GateParams::default(),
        };
        let broken = dir.path().join("broken.png");
        let manager = OutputManager::new(&config, &broken);
        let result = CheckProcessor::process_single_image(&broken, &config, &manager).unwrap();
        assert!(!result.valid);
        assert!(result.decode_error.is_some());

        let tiny = dir.path().join("tiny.png");
        let result = CheckProcessor::process_single_image(&tiny, &config, &manager).unwrap();
        assert!(!result.valid);
        assert!(result.user_output().contains("smaller than the minimum size"));
    }

    #[test]
    fn test_analyze_run_writes_outputs_and_metadata() {
        let dir = TempDir::new().unwrap();
        room_like(&dir.path().join("living.png"));
        RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]))
            .save(dir.path().join("dark.png"))
            .unwrap();

        let config = AnalyzeConfig {
            base: base(dir.path(), true),
            layout_zones: true,
            debug_dump_images: true,
            params: AnalysisParams::default(),
        };
        assert_eq!(run_processing::<AnalyzeProcessor>(config).unwrap(), 2);

        assert!(dir.path().join("living_zones.png").exists());
        assert!(dir.path().join("living_edges_60_140.png").exists());
        assert!(dir.path().join("living_edges_70_150.png").exists());
        assert!(!dir.path().join("dark_zones.png").exists());

        let text = std::fs::read_to_string(dir.path().join("living.roomscan.toml")).unwrap();
        assert!(text.contains("[analyze]"));
        assert!(text.contains("valid = true"));
        assert!(text.contains("living_zones.png"));

        let text = std::fs::read_to_string(dir.path().join("dark.roomscan.toml")).unwrap();
        assert!(text.contains("valid = false"));
        assert!(!text.contains("room_state"));
    }

    #[test]
    fn test_strict_run_fails_on_missing_source() {
        let config = CheckConfig {
            base: BaseConfig {
                sources: vec!["/no/such/room.jpg".to_string()],
                output_dir: None,
                skip_metadata: true,
                strict: true,
            },
            gate: GateParams::default(),
        };
        assert!(run_processing::<CheckProcessor>(config).is_err());
    }

    #[test]
    fn test_matching_source() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("a.png");
        let sources = vec![
            "/elsewhere/*.jpg".to_string(),
            dir.path().join("*.png").to_string_lossy().to_string(),
        ];
        assert_eq!(matching_source(&sources, &image), sources[1]);
    }
}
