//! Batch conversion: one target format across every matching file in a
//! directory.
//!
//! A batch never aborts because of one file. Each file gets a
//! [`FileOutcome`]; only problems with the job itself (missing input
//! directory, bad pattern, uncreatable output directory) fail the run.

use crate::convert::{ConversionRequest, DocumentConverter};
use crate::error::{ConvertError, ErrorKind};
use crate::format::Format;
use crate::progress::BatchProgress;
use crate::validate::validate_dir;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pattern matching every file.
pub const MATCH_ALL: &str = "*";

/// A batch conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target: Format,
    /// Glob matched against file names (not paths). Default: `*`.
    pub pattern: String,
}

impl BatchJob {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, target: Format) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            target,
            pattern: MATCH_ALL.to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// `<input_dir>/converted_<target>`, used when no output directory is
    /// given.
    pub fn default_output_dir(input_dir: &Path, target: Format) -> PathBuf {
        input_dir.join(format!("converted_{}", target.name()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Succeeded,
    Failed,
    /// Not attempted (over the size limit).
    Skipped,
}

/// Result for one file of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target: Format,
    /// Files matched by the pattern.
    pub total: usize,
    pub success: usize,
    /// `total - success`; includes skipped files.
    pub failure: usize,
    pub duration_ms: u64,
    /// One entry per matched file, in enumeration order.
    pub outcomes: Vec<FileOutcome>,
}

/// Run `job` through `converter`.
///
/// # Errors
/// - [`ConvertError::NotFound`] / [`ConvertError::NotADirectory`] for the
///   input directory (checked before anything is created)
/// - [`ConvertError::UnsupportedTarget`] for a source-only target
/// - [`ConvertError::InvalidPattern`] for a malformed glob
/// - [`ConvertError::CreateDirFailed`] / [`ConvertError::ReadDirFailed`]
pub async fn run_batch(
    converter: &DocumentConverter,
    job: &BatchJob,
    progress: Option<&BatchProgress>,
) -> Result<BatchResult, ConvertError> {
    let start = Instant::now();
    info!(
        "Batch {} -> {} ({}, pattern '{}')",
        job.input_dir.display(),
        job.output_dir.display(),
        job.target,
        job.pattern
    );

    validate_dir(&job.input_dir)?;
    if !job.target.is_supported_target() {
        return Err(ConvertError::UnsupportedTarget { format: job.target });
    }
    let pattern = glob::Pattern::new(&job.pattern).map_err(|e| ConvertError::InvalidPattern {
        pattern: job.pattern.clone(),
        reason: e.to_string(),
    })?;
    tokio::fs::create_dir_all(&job.output_dir)
        .await
        .map_err(|e| ConvertError::CreateDirFailed {
            path: job.output_dir.clone(),
            source: e,
        })?;

    let files = list_matching_files(&job.input_dir, &pattern).await?;
    let total = files.len();
    debug!("Batch matched {} file(s)", total);
    if let Some(cb) = progress {
        cb.on_batch_start(total);
    }

    let max_size = converter.config().max_file_size;
    let concurrency = converter.config().batch_concurrency.max(1);

    let outcomes: Vec<FileOutcome> = stream::iter(files.into_iter().enumerate())
        .map(|(index, file)| async move {
            if let Some(cb) = progress {
                cb.on_file_start(index, total, &file);
            }
            let outcome = convert_one(converter, job, file, max_size).await;
            if let Some(cb) = progress {
                cb.on_file_complete(index, total, &outcome);
            }
            outcome
        })
        .buffered(concurrency)
        .collect()
        .await;

    let success = outcomes
        .iter()
        .filter(|o| o.status == FileStatus::Succeeded)
        .count();
    if let Some(cb) = progress {
        cb.on_batch_complete(total, success);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {}/{} succeeded in {}ms",
        success, total, duration_ms
    );

    Ok(BatchResult {
        input_dir: job.input_dir.clone(),
        output_dir: job.output_dir.clone(),
        target: job.target,
        total,
        success,
        failure: total - success,
        duration_ms,
        outcomes,
    })
}

async fn convert_one(
    converter: &DocumentConverter,
    job: &BatchJob,
    file: PathBuf,
    max_size: u64,
) -> FileOutcome {
    // Oversize files are skipped, not attempted.
    if let Ok(meta) = tokio::fs::metadata(&file).await {
        if meta.len() > max_size {
            let e = ConvertError::TooLarge {
                path: file.clone(),
                size: meta.len(),
                limit: max_size,
            };
            warn!("Skipping {}: {}", file.display(), e);
            return FileOutcome {
                file,
                status: FileStatus::Skipped,
                output_path: None,
                message: e.to_string(),
                error_kind: Some(e.kind()),
                strategy: None,
            };
        }
    }

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let output = job
        .output_dir
        .join(format!("{stem}.{}", job.target.default_extension()));

    let request = ConversionRequest::new(&file, job.target).with_output(output);
    let result = converter.convert(&request).await;
    FileOutcome {
        file,
        status: if result.is_success() {
            FileStatus::Succeeded
        } else {
            FileStatus::Failed
        },
        output_path: result.output_path,
        message: result.message,
        error_kind: result.error_kind,
        strategy: result.strategy,
    }
}

/// Regular files directly inside `dir` whose name matches `pattern`, in
/// directory enumeration order. Symlinks are followed.
async fn list_matching_files(
    dir: &Path,
    pattern: &glob::Pattern,
) -> Result<Vec<PathBuf>, ConvertError> {
    let read_failed = |e: std::io::Error| ConvertError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_failed)?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            files.push(path);
        }
    }
    Ok(files)
}
