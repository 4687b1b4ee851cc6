//! Error types for the edgequake-docconv library.
//!
//! Three layers of failure, each with its own type:
//!
//! * [`ConvertError`] — **request-level**: the conversion of one input could
//!   not produce an output (missing file, unsupported format, every strategy
//!   failed). Each variant maps onto a stable [`ErrorKind`] so results can be
//!   reported as data instead of as an interrupted call.
//!
//! * [`StrategyError`] — **attempt-level, non-fatal**: one strategy failed for
//!   one request. The chain logs it and moves on to the next candidate; only
//!   exhaustion of every candidate is surfaced as
//!   [`ConvertError::StrategyExhausted`].
//!
//! * [`SetupError`] — **startup**: the configuration is invalid or no engine
//!   could be initialised. The process should refuse to start.

use crate::engine::EngineError;
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable, serialisable classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    NotAFile,
    TooLarge,
    UnsupportedFormat,
    StrategyExhausted,
    IoFailure,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotAFile => "not_a_file",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::StrategyExhausted => "strategy_exhausted",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request-level failure.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory does not exist.
    #[error("Path not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Input path exists but is not a regular file.
    #[error("Path is not a file: '{path}'")]
    NotAFile { path: PathBuf },

    /// Input path exists but is not a directory.
    #[error("Path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Input file exceeds the configured size limit.
    #[error("File '{path}' is too large: {size} bytes exceeds the limit of {limit} bytes ({limit_mb:.1} MB)", limit_mb = megabytes(.limit))]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    // ── Format errors ─────────────────────────────────────────────────────
    /// The file extension does not belong to any registered format.
    #[error("Unsupported file format '{extension}' for '{path}'")]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// A format name could not be parsed.
    #[error("Unknown format '{name}'. Expected one of: pdf, docx, markdown, html, txt, pptx, xlsx")]
    UnknownFormat { name: String },

    /// The format is registered but cannot be produced as output.
    #[error("Unsupported target format '{format}': it can only be used as a source")]
    UnsupportedTarget { format: Format },

    // ── Strategy errors ───────────────────────────────────────────────────
    /// No strategy declares the pair, or every candidate failed.
    #[error("All conversion strategies failed for {source_format} -> {target} ({attempts} attempted){}", last_error_suffix(.last_error))]
    StrategyExhausted {
        source_format: Format,
        target: Format,
        attempts: usize,
        last_error: Option<String>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create an output directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resolved output path is the input file itself.
    #[error("Output path '{path}' is the input file; refusing to overwrite it")]
    OutputIsInput { path: PathBuf },

    /// Could not list a directory.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Argument errors ───────────────────────────────────────────────────
    /// A batch file pattern is not a valid glob.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ConvertError {
    /// The stable classification reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::NotFound { .. } | ConvertError::NotADirectory { .. } => {
                ErrorKind::NotFound
            }
            ConvertError::NotAFile { .. } => ErrorKind::NotAFile,
            ConvertError::TooLarge { .. } => ErrorKind::TooLarge,
            ConvertError::UnsupportedExtension { .. }
            | ConvertError::UnknownFormat { .. }
            | ConvertError::UnsupportedTarget { .. } => ErrorKind::UnsupportedFormat,
            ConvertError::StrategyExhausted { .. } => ErrorKind::StrategyExhausted,
            ConvertError::CreateDirFailed { .. }
            | ConvertError::OutputWriteFailed { .. }
            | ConvertError::OutputIsInput { .. }
            | ConvertError::ReadDirFailed { .. } => ErrorKind::IoFailure,
            ConvertError::InvalidPattern { .. } => ErrorKind::InvalidArgument,
        }
    }
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(". Last error: {e}"))
        .unwrap_or_default()
}

/// One failed strategy attempt.
///
/// Logged by the chain and otherwise discarded; the chain keeps only the
/// text of the last one for [`ConvertError::StrategyExhausted`].
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The backing engine reported an error.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The attempt did not finish within the configured bound.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Reading the input or writing the staging file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The strategy was invoked with a pair it does not serve.
    #[error("strategy '{strategy}' cannot convert {source_format} -> {target}")]
    UnsupportedPair {
        strategy: &'static str,
        source_format: Format,
        target: Format,
    },
}

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Probing found no usable engine at all.
    #[error("No conversion engine is available.\nInstall markitdown or pandoc, or set PDFIUM_LIB_PATH.")]
    NoEnginesAvailable,
}
