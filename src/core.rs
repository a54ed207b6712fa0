use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use walkdir::WalkDir;

use crate::{
    config::ConversionOptions,
    converter::{FileConverter, ImageConverter},
    error::{BatchError, ConvertError},
    progress::{NoOpProgressReporter, ProgressReporter},
    stats::ConversionStats,
    utils::is_supported_format,
    BatchState, ConversionResult,
};

/// Cooperative cancellation signal, checked before each file.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal state of a batch together with what it accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub state: BatchState,
    pub result: ConversionResult,
}

/// Sequential batch engine: converts a list of files one at a time, isolating
/// failures per file.
pub struct BatchConverter<C: FileConverter = ImageConverter> {
    options: ConversionOptions,
    converter: C,
    cancel: CancelFlag,
    state: Arc<Mutex<BatchState>>,
}

impl BatchConverter<ImageConverter> {
    /// Create a new batch engine using the WebP image converter
    pub fn new(options: ConversionOptions) -> Self {
        Self::with_converter(options, ImageConverter::new())
    }
}

impl<C: FileConverter> BatchConverter<C> {
    pub fn with_converter(options: ConversionOptions, converter: C) -> Self {
        Self {
            options,
            converter,
            cancel: CancelFlag::new(),
            state: Arc::new(Mutex::new(BatchState::Idle)),
        }
    }

    /// Handle that cancels this batch when set from any thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        read_state(&self.state)
    }

    /// Run the batch on the calling thread
    pub fn run(&self, files: &[PathBuf]) -> BatchOutcome {
        self.run_with_progress(files, &NoOpProgressReporter)
    }

    /// Run the batch on the calling thread with progress reporting
    pub fn run_with_progress(
        &self,
        files: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let total = files.len();
        let short_edge_size = self.options.short_edge_size;

        log::info!("Starting batch conversion of {} files", total);
        self.set_state(BatchState::Running);
        reporter.set_message("Starting conversion...");
        reporter.update_progress(0, total);

        let mut stats = ConversionStats::new();
        let mut state = BatchState::Completed;

        for (index, input) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                log::info!("Conversion cancelled after {} of {} files", index, total);
                state = BatchState::Cancelled;
                break;
            }

            let file_name = display_name(input);
            reporter.set_message(&format!("Converting: {file_name}"));

            let original_size = std::fs::metadata(input).map_or(0, |m| m.len());

            match self.convert_isolated(input, short_edge_size) {
                Ok(output_path) => {
                    // Only credit savings for output we can actually see on disk
                    let output_size = std::fs::metadata(&output_path).ok().map(|m| m.len());
                    stats.record_success(original_size, output_size);
                    reporter.report_success(&file_name, original_size, output_size);
                    log::debug!("Successfully converted: {}", file_name);
                }
                Err(e) => {
                    let cause = e.to_string();
                    log::error!("Failed to convert {}: {}", input.display(), cause);
                    stats.record_error(&file_name, &cause);
                    reporter.report_error(&file_name, &cause);
                }
            }

            reporter.update_progress(index + 1, total);
        }

        let result = stats.into_result();
        match state {
            BatchState::Cancelled => reporter.set_message("Conversion cancelled"),
            _ => reporter.set_message("Conversion complete"),
        }
        log::info!(
            "Batch conversion {}: {} successful, {} failed",
            state,
            result.success_count,
            result.fail_count
        );

        self.set_state(state);
        reporter.finish_conversion(&result);

        BatchOutcome { state, result }
    }

    /// Convert one file, turning a panic inside the codec into a per-file error.
    fn convert_isolated(&self, input: &Path, short_edge_size: i32) -> Result<PathBuf, ConvertError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.converter.convert_one(input, short_edge_size)
        }))
        .unwrap_or_else(|payload| Err(ConvertError::Fault(panic_message(&*payload))))
    }

    fn set_state(&self, state: BatchState) {
        write_state(&self.state, state);
    }
}

impl<C: FileConverter + 'static> BatchConverter<C> {
    /// Run the batch on a dedicated worker thread.
    pub fn spawn(
        self,
        files: Vec<PathBuf>,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<BatchHandle, BatchError> {
        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);

        let spawned = std::thread::Builder::new()
            .name("webp-batch".to_string())
            .spawn(move || self.run_with_progress(&files, &*reporter));

        match spawned {
            Ok(thread) => Ok(BatchHandle {
                cancel,
                state,
                thread,
            }),
            Err(e) => {
                write_state(&state, BatchState::Failed);
                Err(BatchError::Spawn(e))
            }
        }
    }
}

/// A batch running on its worker thread.
pub struct BatchHandle {
    cancel: CancelFlag,
    state: Arc<Mutex<BatchState>>,
    thread: JoinHandle<BatchOutcome>,
}

impl BatchHandle {
    /// Ask the batch to stop before its next file. The file in flight still completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        read_state(&self.state)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and collect its outcome.
    pub fn join(self) -> Result<BatchOutcome, BatchError> {
        self.thread.join().map_err(|payload| {
            write_state(&self.state, BatchState::Failed);
            let message = panic_message(&*payload);
            log::error!("Conversion worker failed: {}", message);
            BatchError::WorkerPanicked(message)
        })
    }
}

/// List the convertible images directly inside `dir`, sorted by file name.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BatchError::Scan {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_file() && is_supported_format(path) {
            files.push(path.to_path_buf());
        }
    }

    log::info!("Found {} image files in {}", files.len(), dir.display());
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn read_state(state: &Mutex<BatchState>) -> BatchState {
    state.lock().map(|s| *s).unwrap_or(BatchState::Failed)
}

fn write_state(state: &Mutex<BatchState>, value: BatchState) {
    if let Ok(mut current) = state.lock() {
        *current = value;
    }
}
