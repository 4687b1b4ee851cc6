//! pandoc CLI: direct conversion between many markup formats.
//!
//! Plain-text input is read as markdown (pandoc has no plain-text reader);
//! plain-text output uses pandoc's `plain` writer. PDF output is inferred
//! by pandoc from the `.pdf` output extension and needs a PDF engine
//! (LaTeX by default) on the host.

use super::{probe_program, run_program, EngineError, UniversalConverter};
use crate::format::{Format, FormatPair};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENGINE: &str = "pandoc";

const READERS: &[Format] = &[Format::Markdown, Format::Html, Format::Docx, Format::Txt];

const WRITERS: &[Format] = &[
    Format::Markdown,
    Format::Html,
    Format::Docx,
    Format::Txt,
    Format::Pdf,
];

/// Universal converter backed by the `pandoc` command-line tool.
#[derive(Debug, Clone)]
pub struct PandocCli {
    program: PathBuf,
}

impl PandocCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// pandoc reader name for `format`.
fn reader_name(format: Format) -> Option<&'static str> {
    match format {
        Format::Markdown | Format::Txt => Some("markdown"),
        Format::Html => Some("html"),
        Format::Docx => Some("docx"),
        _ => None,
    }
}

/// pandoc writer name for `format`. `None` for PDF, which pandoc selects
/// from the output file extension.
fn writer_name(format: Format) -> Option<&'static str> {
    match format {
        Format::Markdown => Some("markdown"),
        Format::Html => Some("html"),
        Format::Docx => Some("docx"),
        Format::Txt => Some("plain"),
        _ => None,
    }
}

/// Build the pandoc argument list for one conversion.
fn build_args(input: &Path, pair: FormatPair, output: &Path) -> Result<Vec<String>, EngineError> {
    let from = reader_name(pair.source).ok_or_else(|| EngineError::Unsupported {
        engine: ENGINE,
        detail: format!("reading {}", pair.source),
    })?;
    if !WRITERS.contains(&pair.target) {
        return Err(EngineError::Unsupported {
            engine: ENGINE,
            detail: format!("writing {}", pair.target),
        });
    }

    let mut args = vec![
        input.to_string_lossy().to_string(),
        "-f".to_string(),
        from.to_string(),
    ];
    if let Some(to) = writer_name(pair.target) {
        args.extend(["-t".to_string(), to.to_string()]);
    }
    if pair.target == Format::Html {
        args.push("--standalone".to_string());
    }
    args.extend(["-o".to_string(), output.to_string_lossy().to_string()]);
    Ok(args)
}

#[async_trait]
impl UniversalConverter for PandocCli {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn probe(&self) -> Result<(), EngineError> {
        probe_program(ENGINE, &self.program).await
    }

    fn readers(&self) -> &[Format] {
        READERS
    }

    fn writers(&self) -> &[Format] {
        WRITERS
    }

    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        output: &Path,
    ) -> Result<(), EngineError> {
        let args = build_args(input, pair, output)?;
        debug!("{} {}", ENGINE, args.join(" "));
        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        run_program(ENGINE, &self.program, &os_args).await?;
        Ok(())
    }
}
