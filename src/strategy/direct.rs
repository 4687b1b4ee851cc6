//! Direct strategy: hand-written converters for a few specific pairs.
//!
//! | Pair             | Engine              | Output                         |
//! |------------------|---------------------|--------------------------------|
//! | pdf → txt        | pdfium              | page texts joined by a blank line |
//! | txt → docx       | docx writer         | one paragraph per line         |
//! | markdown → html  | markdown renderer   | fragment in a styled template  |

use super::{ConversionStrategy, PairPattern, StrategyDescriptor};
use crate::capability::Engine;
use crate::engine::{docx, markdown, EngineError, PdfTextExtractor};
use crate::error::StrategyError;
use crate::format::{Format, FormatPair};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub const NAME: &str = "direct";
pub const PRIORITY: u8 = 10;

const PAGE_SEPARATOR: &str = "\n\n";

pub struct DirectStrategy {
    descriptor: StrategyDescriptor,
    pdf_text: Arc<dyn PdfTextExtractor>,
}

impl DirectStrategy {
    pub fn new(pdf_text: Arc<dyn PdfTextExtractor>) -> Self {
        Self {
            descriptor: StrategyDescriptor {
                name: NAME,
                priority: PRIORITY,
                pairs: vec![
                    PairPattern::exact(Format::Pdf, Format::Txt),
                    PairPattern::exact(Format::Txt, Format::Docx),
                    PairPattern::exact(Format::Markdown, Format::Html),
                ],
            },
            pdf_text,
        }
    }
}

/// Join page texts with a blank line between pages.
pub fn join_pages(pages: &[String]) -> String {
    pages.join(PAGE_SEPARATOR)
}

#[async_trait]
impl ConversionStrategy for DirectStrategy {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn engine(&self, pair: FormatPair) -> Engine {
        match (pair.source, pair.target) {
            (Format::Pdf, Format::Txt) => Engine::Pdfium,
            (Format::Txt, Format::Docx) => Engine::DocxWriter,
            _ => Engine::MarkdownRenderer,
        }
    }

    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        staging: &Path,
    ) -> Result<(), StrategyError> {
        match (pair.source, pair.target) {
            (Format::Pdf, Format::Txt) => {
                let pages = self.pdf_text.page_texts(input).await?;
                tokio::fs::write(staging, join_pages(&pages)).await?;
            }
            (Format::Txt, Format::Docx) => {
                let bytes = tokio::fs::read(input).await?;
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let staging = staging.to_path_buf();
                tokio::task::spawn_blocking(move || docx::write_paragraphs(&text, &staging))
                    .await
                    .map_err(|e| EngineError::TaskFailed {
                        engine: "docx-writer",
                        detail: e.to_string(),
                    })??;
            }
            (Format::Markdown, Format::Html) => {
                let bytes = tokio::fs::read(input).await?;
                let html = markdown::render_document(&String::from_utf8_lossy(&bytes));
                tokio::fs::write(staging, html).await?;
            }
            _ => {
                return Err(StrategyError::UnsupportedPair {
                    strategy: NAME,
                    source_format: pair.source,
                    target: pair.target,
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_separated_by_blank_line() {
        let pages = vec!["p1".to_string(), "p2".to_string()];
        assert_eq!(join_pages(&pages), "p1\n\np2");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn engine_follows_pair() {
        let s = DirectStrategy::new(Arc::new(crate::engine::pdfium::PdfiumTextExtractor::default()));
        assert_eq!(s.engine(FormatPair::new(Format::Pdf, Format::Txt)), Engine::Pdfium);
        assert_eq!(s.engine(FormatPair::new(Format::Txt, Format::Docx)), Engine::DocxWriter);
        assert_eq!(
            s.engine(FormatPair::new(Format::Markdown, Format::Html)),
            Engine::MarkdownRenderer
        );
    }
}
