//! Conditional colored output for log prefixes and status symbols.
//!
//! Colors are disabled by any of:
//! - the `--no-color` CLI flag
//! - `NO_COLOR` (https://no-color.org/)
//! - `ROOMSCAN_NO_COLOR`
//! - `TERM=dumb`
//! - stderr not being a TTY

use colored::ColoredString;
use std::io::{stderr, IsTerminal};
use std::sync::OnceLock;

static COLOR_CONFIG: OnceLock<ColorConfig> = OnceLock::new();

fn should_disable_colors_from_env() -> bool {
    !std::env::var("NO_COLOR").unwrap_or_default().is_empty()
        || !std::env::var("ROOMSCAN_NO_COLOR").unwrap_or_default().is_empty()
        || std::env::var("TERM").unwrap_or_default() == "dumb"
        || !stderr().is_terminal()
}

#[derive(Debug, Clone)]
struct ColorConfig {
    colors_enabled: bool,
}

impl ColorConfig {
    fn new(no_color_flag: bool) -> Self {
        Self {
            colors_enabled: !no_color_flag && !should_disable_colors_from_env(),
        }
    }
}

/// Record the CLI flag. Call once, right after argument parsing.
pub fn init_color_config(no_color_flag: bool) {
    if COLOR_CONFIG.set(ColorConfig::new(no_color_flag)).is_err() {
        eprintln!("Warning: Color configuration already initialized");
    }
}

fn colors_enabled() -> bool {
    COLOR_CONFIG
        .get()
        .map(|config| config.colors_enabled)
        .unwrap_or_else(|| !should_disable_colors_from_env())
}

pub fn maybe_color_stderr<F>(text: &str, color_fn: F) -> String
where
    F: FnOnce(&str) -> ColoredString,
{
    if colors_enabled() {
        color_fn(text).to_string()
    } else {
        text.to_string()
    }
}

pub mod colors {
    use super::maybe_color_stderr;
    use colored::Colorize;

    pub fn error_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.red().bold())
    }

    pub fn warning_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.yellow())
    }

    pub fn info_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.green())
    }

    pub fn debug_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.blue())
    }

    pub fn trace_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.magenta())
    }

    /// Room validity verdict in the analysis report
    pub fn verdict(text: &str, accepted: bool) -> String {
        if accepted {
            maybe_color_stderr(text, |s| s.green().bold())
        } else {
            maybe_color_stderr(text, |s| s.red().bold())
        }
    }
}

/// Status symbols, with plain-text fallbacks when colors are off
pub mod symbols {
    use super::colors_enabled;

    fn pick(fancy: &'static str, plain: &'static str) -> &'static str {
        if colors_enabled() {
            fancy
        } else {
            plain
        }
    }

    pub fn check_start() -> &'static str {
        pick("🔍 ", "")
    }

    pub fn analyze_start() -> &'static str {
        pick("🛋️  ", "[ANALYZE] ")
    }

    pub fn resources_found() -> &'static str {
        pick("🎯 ", "")
    }

    pub fn image_accepted() -> &'static str {
        pick("✅ ", "[VALID] ")
    }

    pub fn image_rejected() -> &'static str {
        pick("🚫 ", "[INVALID] ")
    }

    pub fn operation_failed() -> &'static str {
        pick("❌ ", "[FAILED] ")
    }

    pub fn completed_successfully() -> &'static str {
        pick("✅ ", "[SUCCESS] ")
    }

    pub fn completed_partially_successfully() -> &'static str {
        pick("⚠️  ", "[PARTIAL-SUCCESS] ")
    }

    pub fn warning() -> &'static str {
        pick("⚠️  ", "")
    }
}

/// Progress bars that only appear on an interactive stderr
pub mod progress {
    use super::colors_enabled;
    use crate::progress::add_progress_bar;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::io::{stderr, IsTerminal};

    /// `None` for single images or when stderr is not a terminal
    pub fn create_batch_progress_bar(total: usize) -> Option<ProgressBar> {
        if total <= 1 || !stderr().is_terminal() {
            return None;
        }

        let pb = ProgressBar::new(total as u64);
        add_progress_bar(pb.clone());
        let (template, chars) = if colors_enabled() {
            (
                "[{elapsed_precise}] [{bar:30.green/black}] ({percent}%) {msg}",
                "█▓▒░",
            )
        } else {
            ("[{elapsed_precise}] [{bar:30}] ({percent}%) {msg}", "#> ")
        };
        // Templates are static; fall back to the default style if one is rejected
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(chars);
        pb.set_style(style);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Some(pb)
    }
}
