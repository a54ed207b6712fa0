use crossbeam_channel::{Receiver, Sender};

use crate::ConversionResult;

/// Trait for reporting conversion progress
/// This allows different interfaces (CLI, GUI) to implement their own progress display
///
/// Calls arrive from the batch worker in order: a status message before each
/// file, then `update_progress` once the file is done.
pub trait ProgressReporter: Send + Sync {
    /// `completed` of `total` files have been attempted
    fn update_progress(&self, completed: usize, total: usize);

    /// Free-text status, e.g. the file about to be converted
    fn set_message(&self, message: &str);

    /// Report that the batch has ended, normally or by cancellation
    fn finish_conversion(&self, _result: &ConversionResult) {}

    /// Report an error for a specific file
    fn report_error(&self, _file_name: &str, _error: &str) {}

    /// Report successful conversion of a file
    fn report_success(&self, _file_name: &str, _original_size: u64, _output_size: Option<u64>) {}
}

/// A no-op progress reporter for when progress reporting is not needed
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn update_progress(&self, _completed: usize, _total: usize) {}
    fn set_message(&self, _message: &str) {}
}

/// Observable change emitted by [`ChannelProgressReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress { completed: usize, total: usize },
    Status(String),
    Finished(ConversionResult),
}

/// Forwards progress as [`ProgressEvent`]s over a channel, for callers that
/// poll from their own thread or event loop.
pub struct ChannelProgressReporter {
    sender: Sender<ProgressEvent>,
}

impl ChannelProgressReporter {
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProgressEvent) {
        // receiver gone means nobody is watching
        let _ = self.sender.send(event);
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn update_progress(&self, completed: usize, total: usize) {
        self.send(ProgressEvent::Progress { completed, total });
    }

    fn set_message(&self, message: &str) {
        self.send(ProgressEvent::Status(message.to_string()));
    }

    fn finish_conversion(&self, result: &ConversionResult) {
        self.send(ProgressEvent::Finished(result.clone()));
    }
}

/// Console-based progress reporter using indicatif
#[cfg(feature = "cli")]
pub struct ConsoleProgressReporter {
    progress_bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ConsoleProgressReporter {
    pub fn new() -> Self {
        let progress_bar = indicatif::ProgressBar::new(0);

        let style = indicatif::ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);

        Self { progress_bar }
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for ConsoleProgressReporter {
    fn update_progress(&self, completed: usize, total: usize) {
        self.progress_bar.set_length(total as u64);
        self.progress_bar.set_position(completed as u64);
    }

    fn set_message(&self, message: &str) {
        self.progress_bar.set_message(message.to_string());
    }

    fn finish_conversion(&self, _result: &ConversionResult) {
        self.progress_bar.finish();
    }

    fn report_error(&self, file_name: &str, error: &str) {
        self.progress_bar
            .println(format!("❌ Error processing {file_name}: {error}"));
    }

    fn report_success(&self, file_name: &str, original_size: u64, output_size: Option<u64>) {
        let Some(output_size) = output_size else {
            self.progress_bar.println(format!("✅ {file_name}"));
            return;
        };

        let ratio = if original_size > 0 {
            (original_size as f64 - output_size as f64) / original_size as f64 * 100.0
        } else {
            0.0
        };

        self.progress_bar.println(format!(
            "✅ {} -> {} ({:.1}% reduction)",
            file_name,
            crate::utils::format_bytes(output_size),
            ratio
        ));
    }
}
