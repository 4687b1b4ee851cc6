//! markitdown CLI: rich document → markdown.
//!
//! `markitdown <file>` prints the extracted markdown on stdout. It handles
//! PDF, DOCX, PPTX, XLSX, HTML and plain text, which makes it the pivot for
//! every text-oriented target.

use super::{probe_program, run_program, DocumentExtractor, EngineError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENGINE: &str = "markitdown";

/// Extractor backed by the `markitdown` command-line tool.
#[derive(Debug, Clone)]
pub struct MarkItDownCli {
    program: PathBuf,
}

impl MarkItDownCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl DocumentExtractor for MarkItDownCli {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn probe(&self) -> Result<(), EngineError> {
        probe_program(ENGINE, &self.program).await
    }

    async fn extract(&self, input: &Path) -> Result<String, EngineError> {
        let stdout = run_program(ENGINE, &self.program, &[input.as_os_str()]).await?;
        let text = String::from_utf8(stdout).map_err(|e| EngineError::InvalidOutput {
            engine: ENGINE,
            detail: format!("stdout is not UTF-8: {e}"),
        })?;
        debug!("{} extracted {} chars from {}", ENGINE, text.len(), input.display());
        Ok(text)
    }
}
