//! PDF text extraction via pdfium.
//!
//! pdfium is not async-safe and its calls are CPU-bound, so every call runs
//! inside `spawn_blocking`. The library is bound per call: an explicit
//! `PDFIUM_LIB_PATH` wins, then a copy next to the working directory, then
//! the system library.

use super::{EngineError, PdfTextExtractor};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENGINE: &str = "pdfium";

/// Page-text extractor backed by the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    library: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

fn bind(library: Option<&Path>) -> Result<Pdfium, EngineError> {
    let bindings = match library {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| EngineError::Pdfium(format!("failed to load library: {e:?}")))?;
    Ok(Pdfium::new(bindings))
}

fn page_texts_blocking(library: Option<&Path>, input: &Path) -> Result<Vec<String>, EngineError> {
    let pdfium = bind(library)?;
    let document = pdfium
        .load_pdf_from_file(input, None)
        .map_err(|e| EngineError::Pdfium(format!("cannot open {}: {e:?}", input.display())))?;

    let mut texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| EngineError::Pdfium(format!("page {}: {e:?}", idx + 1)))?;
        texts.push(text.all());
    }
    debug!("{} read {} pages from {}", ENGINE, texts.len(), input.display());
    Ok(texts)
}

#[async_trait]
impl PdfTextExtractor for PdfiumTextExtractor {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn probe(&self) -> Result<(), EngineError> {
        let library = self.library.clone();
        tokio::task::spawn_blocking(move || bind(library.as_deref()).map(|_| ()))
            .await
            .map_err(|e| EngineError::TaskFailed {
                engine: ENGINE,
                detail: e.to_string(),
            })?
    }

    async fn page_texts(&self, input: &Path) -> Result<Vec<String>, EngineError> {
        let library = self.library.clone();
        let input = input.to_path_buf();
        tokio::task::spawn_blocking(move || page_texts_blocking(library.as_deref(), &input))
            .await
            .map_err(|e| EngineError::TaskFailed {
                engine: ENGINE,
                detail: e.to_string(),
            })?
    }
}
