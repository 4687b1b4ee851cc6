//! Single-document conversion: validation, output resolution, and dispatch
//! to the identity copy or the strategy chain.
//!
//! Steps, in order, for one [`ConversionRequest`]:
//!
//! 1. validate the input path (exists, regular file, within size limit)
//! 2. detect the source format from the extension
//! 3. check that the target format can be produced at all
//! 4. resolve the output path and create its parent directory
//! 5. identity copy when source == target, otherwise run the chain
//!
//! Nothing is read from the input before step 1 passes, and no directory
//! is created before step 3 passes. The input file is never modified.

use crate::capability::CapabilityMatrix;
use crate::config::ServerConfig;
use crate::error::{ConvertError, ErrorKind};
use crate::format::{Format, FormatPair};
use crate::strategy::{StrategyChain, IDENTITY};
use crate::validate::validate_input;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub target: Format,
    /// Explicit output path, used verbatim. When `None` the output is
    /// `<input stem>.<canonical extension>` next to the input.
    pub output_path: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, target: Format) -> Self {
        Self {
            input_path: input_path.into(),
            target,
            output_path: None,
        }
    }

    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Succeeded,
    Failed,
}

/// Outcome of one request. Failures are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub status: ConversionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Strategy that produced the output (`identity` for same-format
    /// copies); `None` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub duration_ms: u64,
}

impl ConversionResult {
    pub fn succeeded(
        output_path: PathBuf,
        message: String,
        strategy: &str,
        duration_ms: u64,
    ) -> Self {
        Self {
            status: ConversionStatus::Succeeded,
            output_path: Some(output_path),
            message,
            error_kind: None,
            strategy: Some(strategy.to_string()),
            duration_ms,
        }
    }

    pub fn failed(error: &ConvertError, duration_ms: u64) -> Self {
        Self {
            status: ConversionStatus::Failed,
            output_path: None,
            message: error.to_string(),
            error_kind: Some(error.kind()),
            strategy: None,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Succeeded
    }
}

/// A successful conversion, before it is turned into a [`ConversionResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub output_path: PathBuf,
    pub strategy: &'static str,
}

/// Runs single conversions against a fixed configuration, capability
/// matrix, and strategy chain. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    config: Arc<ServerConfig>,
    capabilities: Arc<CapabilityMatrix>,
    chain: StrategyChain,
}

impl DocumentConverter {
    pub fn new(
        config: Arc<ServerConfig>,
        capabilities: Arc<CapabilityMatrix>,
        chain: StrategyChain,
    ) -> Self {
        Self {
            config,
            capabilities,
            chain,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityMatrix {
        &self.capabilities
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    /// Convert one document. Never fails: errors are encoded in the result.
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        let start = Instant::now();
        info!(
            "Converting {} -> {}",
            request.input_path.display(),
            request.target
        );

        match self.try_convert(request).await {
            Ok(done) => {
                let message = if done.strategy == IDENTITY {
                    format!("File copied to: {}", done.output_path.display())
                } else {
                    format!("Successfully converted to: {}", done.output_path.display())
                };
                ConversionResult::succeeded(
                    done.output_path,
                    message,
                    done.strategy,
                    start.elapsed().as_millis() as u64,
                )
            }
            Err(e) => {
                warn!(
                    "Conversion of {} failed [{}]: {}",
                    request.input_path.display(),
                    e.kind(),
                    e
                );
                ConversionResult::failed(&e, start.elapsed().as_millis() as u64)
            }
        }
    }

    /// Convert one document, returning the typed error on failure.
    pub async fn try_convert(&self, request: &ConversionRequest) -> Result<Converted, ConvertError> {
        let input = request.input_path.as_path();

        // ── Step 1: Validate input ───────────────────────────────────────
        validate_input(input, self.config.max_file_size)?;

        // ── Step 2: Detect source format ─────────────────────────────────
        let source = Format::detect(input)?;

        // ── Step 3: Check target ─────────────────────────────────────────
        if !request.target.is_supported_target() {
            return Err(ConvertError::UnsupportedTarget {
                format: request.target,
            });
        }
        let pair = FormatPair::new(source, request.target);

        // ── Step 4: Resolve output path ──────────────────────────────────
        let output = resolve_output_path(input, request.target, request.output_path.as_deref());
        let same_file = is_same_file(input, &output).await;
        if same_file && !pair.is_identity() {
            return Err(ConvertError::OutputIsInput { path: output });
        }
        ensure_parent_dir(&output).await?;
        debug!("{}: output resolved to {}", pair, output.display());

        // ── Step 5: Identity copy or strategy chain ──────────────────────
        if pair.is_identity() {
            if same_file {
                debug!("Output is the input itself; nothing to copy");
            } else {
                tokio::fs::copy(input, &output).await.map_err(|e| {
                    ConvertError::OutputWriteFailed {
                        path: output.clone(),
                        source: e,
                    }
                })?;
            }
            return Ok(Converted {
                output_path: output,
                strategy: IDENTITY,
            });
        }

        let strategy = self
            .chain
            .run(input, pair, &output, &self.capabilities, &self.config)
            .await?;
        Ok(Converted {
            output_path: output,
            strategy,
        })
    }
}

/// The output path for converting `input` to `target`.
///
/// An explicit path is returned verbatim; otherwise the input's stem gets
/// the target's canonical extension, in the input's directory.
pub fn resolve_output_path(input: &Path, target: Format, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}.{}", target.default_extension()))
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<(), ConvertError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        let out = resolve_output_path(Path::new("/docs/report.final.pdf"), Format::Markdown, None);
        assert_eq!(out, PathBuf::from("/docs/report.final.md"));
    }

    #[test]
    fn explicit_output_is_verbatim() {
        let out = resolve_output_path(
            Path::new("/docs/a.md"),
            Format::Html,
            Some(Path::new("out/custom.name")),
        );
        assert_eq!(out, PathBuf::from("out/custom.name"));
    }

    #[test]
    fn failed_result_carries_kind() {
        let e = ConvertError::NotFound {
            path: PathBuf::from("x.md"),
        };
        let r = ConversionResult::failed(&e, 3);
        assert!(!r.is_success());
        assert_eq!(r.error_kind, Some(ErrorKind::NotFound));
        assert!(r.output_path.is_none());

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_kind"], "not_found");
    }

    #[tokio::test]
    async fn same_file_detection_follows_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        std::fs::write(&a, "x").unwrap();
        let dotted = dir.path().join(".").join("a.txt");
        assert!(is_same_file(&a, &dotted).await);
        assert!(!is_same_file(&a, &dir.path().join("b.txt")).await);
    }
}
