//! # webp-batch
//!
//! Batch image to WebP converter core library.
//!
//! The pipeline has three parts: a pre-flight disk space check
//! ([`SpaceValidator`]), the per-file codec ([`ImageConverter`]: decode,
//! short-edge resize, lossy WebP encode) and the batch engine
//! ([`BatchConverter`]) that runs the codec over a file list with progress
//! reporting, cooperative cancellation and per-file failure isolation.

pub mod config;
pub mod converter;
pub mod core;
pub mod error;
pub mod progress;
pub mod space;
pub mod stats;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ConversionOptions, ProfileConfig};
pub use converter::{FileConverter, ImageConverter};
pub use crate::core::{scan_directory, BatchConverter, BatchHandle, BatchOutcome, CancelFlag};
pub use error::{BatchError, ConvertError};
pub use progress::{ChannelProgressReporter, ProgressEvent, ProgressReporter};
pub use space::{SpaceValidator, ValidationResult};
pub use stats::ConversionStats;
pub use utils::{estimate_output_size, format_bytes, format_duration, format_signed_bytes, is_supported_format};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Aggregate outcome of one batch.
///
/// `success_count + fail_count` equals the number of files attempted, which
/// is less than the batch size only when the batch was cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// One `"<file name>: <cause>"` entry per failed file, in processing order
    pub errors: Vec<String>,
    /// Original minus WebP bytes over successful conversions; negative if outputs grew
    pub space_saved: i64,
}

impl ConversionResult {
    pub fn total_count(&self) -> usize {
        self.success_count + self.fail_count
    }
}

/// Lifecycle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    /// The batch itself broke down, as opposed to individual files failing
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Idle => "idle",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
            BatchState::Cancelled => "cancelled",
            BatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Main conversion report structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub input_dir: PathBuf,
    pub short_edge_size: i32,
    pub state: BatchState,
    pub total_files: usize,
    pub result: ConversionResult,
}

/// Write a batch report as pretty-printed JSON
pub fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    log::info!("Report saved to: {}", path.display());
    Ok(())
}
