//! Conversion engines: the external collaborators behind each strategy.
//!
//! Three engines are reached through traits so they can be swapped (or
//! faked in tests) without touching the strategy chain:
//!
//! | Trait                  | Production implementation            |
//! |------------------------|--------------------------------------|
//! | [`DocumentExtractor`]  | [`markitdown::MarkItDownCli`]        |
//! | [`UniversalConverter`] | [`pandoc::PandocCli`]                |
//! | [`PdfTextExtractor`]   | [`pdfium::PdfiumTextExtractor`]      |
//!
//! The word-processor writer ([`docx`]) and markdown renderer ([`markdown`])
//! are linked in-process and used directly.
//!
//! Subprocess engines are spawned with `kill_on_drop`, so dropping the
//! future (for example when a strategy attempt times out) also kills the
//! child process.

pub mod docx;
pub mod markdown;
pub mod markitdown;
pub mod pandoc;
pub mod pdfium;

use crate::config::ServerConfig;
use crate::format::{Format, FormatPair};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt kept in an [`EngineError::ProcessFailed`].
const MAX_STDERR_CHARS: usize = 500;

/// Errors raised by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine's program or library could not be found.
    #[error("{engine} is not installed or not on PATH ('{program}')")]
    NotInstalled { engine: &'static str, program: PathBuf },

    /// The engine process exited unsuccessfully.
    #[error("{engine} exited with {status}: {stderr}")]
    ProcessFailed {
        engine: &'static str,
        status: String,
        stderr: String,
    },

    /// The engine cannot handle the requested conversion.
    #[error("{engine} does not support {detail}")]
    Unsupported { engine: &'static str, detail: String },

    /// The engine ran but its output was unusable.
    #[error("{engine} produced invalid output: {detail}")]
    InvalidOutput { engine: &'static str, detail: String },

    /// pdfium-render returned an error.
    #[error("pdfium: {0}")]
    Pdfium(String),

    /// docx-rs failed to build or pack the document.
    #[error("docx writer: {0}")]
    Docx(String),

    /// I/O error while talking to the engine.
    #[error("I/O error in {engine}: {source}")]
    Io {
        engine: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A blocking engine task panicked or was cancelled.
    #[error("{engine} task failed: {detail}")]
    TaskFailed { engine: &'static str, detail: String },
}

/// Extracts a rich document (PDF, DOCX, PPTX, XLSX, HTML, …) into
/// markdown-like text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Check that the engine can be used.
    async fn probe(&self) -> Result<(), EngineError>;

    /// Extract `input` and return the markdown text.
    async fn extract(&self, input: &Path) -> Result<String, EngineError>;
}

/// Converts directly between many (source, target) pairs in one call.
#[async_trait]
pub trait UniversalConverter: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<(), EngineError>;

    /// Formats the engine can read.
    fn readers(&self) -> &[Format];

    /// Formats the engine can write.
    fn writers(&self) -> &[Format];

    /// Convert `input` according to `pair`, writing the result to `output`.
    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        output: &Path,
    ) -> Result<(), EngineError>;
}

/// Extracts plain text from a PDF, one string per page.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<(), EngineError>;

    async fn page_texts(&self, input: &Path) -> Result<Vec<String>, EngineError>;
}

/// The set of engine clients used by the strategy chain.
#[derive(Clone)]
pub struct Engines {
    pub extractor: Arc<dyn DocumentExtractor>,
    pub universal: Arc<dyn UniversalConverter>,
    pub pdf_text: Arc<dyn PdfTextExtractor>,
}

impl Engines {
    /// Production engines configured from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            extractor: Arc::new(markitdown::MarkItDownCli::new(&config.markitdown_path)),
            universal: Arc::new(pandoc::PandocCli::new(&config.pandoc_path)),
            pdf_text: Arc::new(pdfium::PdfiumTextExtractor::new(
                config.pdfium_lib_path.clone(),
            )),
        }
    }
}

impl fmt::Debug for Engines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engines")
            .field("extractor", &self.extractor.name())
            .field("universal", &self.universal.name())
            .field("pdf_text", &self.pdf_text.name())
            .finish()
    }
}

// ── Subprocess helpers ───────────────────────────────────────────────────

/// Confirm `program` resolves to an executable and answers `--version`.
pub(crate) async fn probe_program(engine: &'static str, program: &Path) -> Result<(), EngineError> {
    let resolved = which::which(program).map_err(|_| EngineError::NotInstalled {
        engine,
        program: program.to_path_buf(),
    })?;
    debug!("{} resolved to {}", engine, resolved.display());
    run_program(engine, &resolved, &[OsStr::new("--version")]).await?;
    Ok(())
}

/// Run `program` with `args` and return its stdout.
///
/// stdin is closed; a non-zero exit becomes [`EngineError::ProcessFailed`]
/// carrying the (truncated) stderr.
pub(crate) async fn run_program(
    engine: &'static str,
    program: &Path,
    args: &[&OsStr],
) -> Result<Vec<u8>, EngineError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotInstalled {
                    engine,
                    program: program.to_path_buf(),
                }
            } else {
                EngineError::Io { engine, source: e }
            }
        })?;

    if !output.status.success() {
        return Err(EngineError::ProcessFailed {
            engine,
            status: output.status.to_string(),
            stderr: truncate_stderr(&output.stderr),
        });
    }

    Ok(output.stdout)
}

fn truncate_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.chars().count() > MAX_STDERR_CHARS {
        let cut: String = text.chars().take(MAX_STDERR_CHARS).collect();
        format!("{cut}\u{2026}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_is_truncated() {
        let long = "x".repeat(MAX_STDERR_CHARS + 20);
        let t = truncate_stderr(long.as_bytes());
        assert_eq!(t.chars().count(), MAX_STDERR_CHARS + 1);
        assert!(t.ends_with('\u{2026}'));
    }

    #[test]
    fn stderr_is_trimmed() {
        assert_eq!(truncate_stderr(b"  boom\n"), "boom");
    }

    #[tokio::test]
    async fn missing_program_is_not_installed() {
        let err = probe_program("ghost", Path::new("definitely-not-a-real-binary-4f2a"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInstalled { engine: "ghost", .. }));
    }

    #[tokio::test]
    async fn run_program_reports_missing_binary() {
        let err = run_program("ghost", Path::new("/nonexistent/bin/ghost"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInstalled { .. }));
    }

    #[test]
    fn debug_lists_engine_names() {
        let engines = Engines::from_config(&ServerConfig::default());
        let dbg = format!("{engines:?}");
        assert!(dbg.contains("markitdown"));
        assert!(dbg.contains("pandoc"));
        assert!(dbg.contains("pdfium"));
    }
}
