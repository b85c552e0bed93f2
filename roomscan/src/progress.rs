//! Shared `MultiProgress` so log lines and batch bars don't interleave.

use indicatif::{MultiProgress, ProgressBar};
use once_cell::sync::Lazy;
use std::sync::Arc;

static MULTI: Lazy<Arc<MultiProgress>> = Lazy::new(|| Arc::new(MultiProgress::new()));

pub fn global_mp() -> Arc<MultiProgress> {
    MULTI.clone()
}

pub fn add_progress_bar(pb: ProgressBar) -> ProgressBar {
    global_mp().add(pb)
}

pub fn remove_progress_bar(pb: &ProgressBar) {
    global_mp().remove(pb);
}

/// Write to stdout with any active bars cleared for the duration
pub fn print_suspended(text: &str) {
    global_mp().suspend(|| print!("{text}"));
}
