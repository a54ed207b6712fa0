//! Pre-flight disk space check.
//!
//! The estimate is advisory: nothing is reserved, so a batch that passes can
//! still hit a full disk and every encode must handle that on its own.

use std::io;
use std::path::{Path, PathBuf};

use crate::utils::{estimate_output_size, format_bytes};

/// Outcome of a space check, shown to the user before a batch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    message: String,
}

impl ValidationResult {
    pub fn new(valid: bool, message: impl Into<String>) -> Self {
        Self {
            valid,
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Source of free space figures for a directory.
pub trait SpaceProbe: Send + Sync {
    fn available_space(&self, dir: &Path) -> io::Result<u64>;
}

/// Asks the filesystem how much space is usable by the current user.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSpaceProbe;

impl SpaceProbe for FsSpaceProbe {
    fn available_space(&self, dir: &Path) -> io::Result<u64> {
        fs2::available_space(dir)
    }
}

/// Checks that a batch's estimated output fits in the target directory.
pub struct SpaceValidator {
    probe: Box<dyn SpaceProbe>,
}

impl Default for SpaceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpaceValidator {
    pub fn new() -> Self {
        Self::with_probe(FsSpaceProbe)
    }

    pub fn with_probe(probe: impl SpaceProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
        }
    }

    /// Validate that `target_dir` can hold the WebP output for `files`.
    pub fn validate(&self, files: &[PathBuf], target_dir: &Path) -> ValidationResult {
        log::info!("Validating disk space for {} files", files.len());

        if files.is_empty() {
            return ValidationResult::new(true, "No files to convert");
        }

        let estimated: u64 = files.iter().map(|f| estimate_output_size(f)).sum();

        let available = match self.probe.available_space(target_dir) {
            Ok(available) => available,
            Err(e) => {
                log::warn!(
                    "Could not query free space of {}: {}",
                    target_dir.display(),
                    e
                );
                return ValidationResult::new(
                    false,
                    format!(
                        "Unable to determine free disk space for {}: {}",
                        target_dir.display(),
                        e
                    ),
                );
            }
        };

        check_space(estimated, available)
    }
}

/// Space needed for an estimated output size, with a 20% safety margin.
pub fn required_space(estimated: u64) -> u64 {
    estimated.saturating_add(estimated / 5)
}

/// Compare an estimated output size against the space available.
pub fn check_space(estimated: u64, available: u64) -> ValidationResult {
    let required = required_space(estimated);

    log::info!(
        "Estimated space needed: {} bytes ({})",
        required,
        format_bytes(required)
    );
    log::info!(
        "Available disk space: {} bytes ({})",
        available,
        format_bytes(available)
    );

    if available < required {
        log::warn!("Insufficient disk space for conversion");
        return ValidationResult::new(
            false,
            format!(
                "Insufficient disk space!\n\nRequired: {}\nAvailable: {}\n\nPlease free up disk space before continuing.",
                format_bytes(required),
                format_bytes(available)
            ),
        );
    }

    log::info!("Disk space validation passed");
    ValidationResult::new(true, "Sufficient disk space available")
}
