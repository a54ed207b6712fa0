use std::path::PathBuf;

/// Failure of a single file's conversion.
///
/// These never abort a batch: the orchestrator records them against the
/// file and moves on to the next one.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("cannot derive output path for {}: file has no extension", .0.display())]
    NoExtension(PathBuf),

    #[error("image of {width}x{height} exceeds the WebP limit of {max}px per side")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("WebP encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("WebP encoding failed: {0}")]
    Encode(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected fault: {0}")]
    Fault(String),
}

/// Failure of the batch as a whole, as opposed to one of its files.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("failed to list {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to start conversion worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("conversion worker terminated abnormally: {0}")]
    WorkerPanicked(String),
}
