use std::path::Path;
use std::time::Duration;

/// Extensions accepted when picking candidate files out of a directory.
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// WebP output is assumed to be roughly 70% of the source size.
const ESTIMATED_COMPRESSION_PERCENT: u64 = 70;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a byte count with 1024-based units: `500 B`, `1.50 KB`, `1.50 MB`, `2.00 GB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

/// Like [`format_bytes`], with a leading `-` for negative amounts.
pub fn format_signed_bytes(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_bytes(bytes.unsigned_abs()))
    } else {
        format_bytes(bytes as u64)
    }
}

/// Get file extension (lowercase)
fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// True if the path carries one of the [`SUPPORTED_FORMATS`] extensions.
///
/// Only the name is inspected; the content may still fail to decode.
pub fn is_supported_format(path: &Path) -> bool {
    get_file_extension(path)
        .is_some_and(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
}

/// Rough WebP size for a file, without decoding it.
///
/// A file whose metadata cannot be read counts as empty.
pub fn estimate_output_size(path: &Path) -> u64 {
    let original = std::fs::metadata(path).map_or(0, |m| m.len());
    estimate_from_len(original)
}

/// `round(len * 0.7)`, half rounding up.
pub(crate) fn estimate_from_len(len: u64) -> u64 {
    (len.saturating_mul(ESTIMATED_COMPRESSION_PERCENT) + 50) / 100
}
