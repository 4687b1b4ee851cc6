//! Extraction strategy: rich document → markdown via the extractor engine,
//! optionally stripped further to plain text.
//!
//! Sources no universal converter can read (pdf, pptx, xlsx) also pivot
//! through the extracted markdown to reach html and docx.

use super::{ConversionStrategy, PairPattern, StrategyDescriptor};
use crate::capability::Engine;
use crate::engine::{docx, markdown, DocumentExtractor, EngineError};
use crate::error::StrategyError;
use crate::format::{Format, FormatPair};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub const NAME: &str = "extraction";
pub const PRIORITY: u8 = 30;

/// Sources reachable only through extraction.
const PIVOT_SOURCES: [Format; 3] = [Format::Pdf, Format::Pptx, Format::Xlsx];

/// Targets produced from the extracted markdown.
const PIVOT_TARGETS: [Format; 2] = [Format::Html, Format::Docx];

pub struct ExtractionStrategy {
    descriptor: StrategyDescriptor,
    extractor: Arc<dyn DocumentExtractor>,
}

impl ExtractionStrategy {
    pub fn new(extractor: Arc<dyn DocumentExtractor>) -> Self {
        let mut pairs = vec![PairPattern::to(Format::Markdown), PairPattern::to(Format::Txt)];
        for source in PIVOT_SOURCES {
            for target in PIVOT_TARGETS {
                pairs.push(PairPattern::exact(source, target));
            }
        }

        Self {
            descriptor: StrategyDescriptor {
                name: NAME,
                priority: PRIORITY,
                pairs,
            },
            extractor,
        }
    }
}

#[async_trait]
impl ConversionStrategy for ExtractionStrategy {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn engine(&self, _pair: FormatPair) -> Engine {
        Engine::Markitdown
    }

    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        staging: &Path,
    ) -> Result<(), StrategyError> {
        let text = self.extractor.extract(input).await?;
        match pair.target {
            Format::Markdown => tokio::fs::write(staging, text).await?,
            Format::Txt => tokio::fs::write(staging, markdown::to_plain_text(&text)).await?,
            Format::Html => tokio::fs::write(staging, markdown::render_document(&text)).await?,
            Format::Docx => {
                let staging = staging.to_path_buf();
                tokio::task::spawn_blocking(move || docx::write_paragraphs(&text, &staging))
                    .await
                    .map_err(|e| EngineError::TaskFailed {
                        engine: "docx-writer",
                        detail: e.to_string(),
                    })??;
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
    use crate::engine::markitdown::MarkItDownCli;

    fn strategy() -> ExtractionStrategy {
        ExtractionStrategy::new(Arc::new(MarkItDownCli::new("markitdown")))
    }

    #[test]
    fn serves_every_source_for_text_targets() {
        let s = strategy();
        for source in Format::ALL {
            for target in [Format::Markdown, Format::Txt] {
                let pair = FormatPair::new(source, target);
                assert_eq!(s.descriptor().supports(pair), !pair.is_identity(), "{pair}");
            }
        }
    }

    #[test]
    fn pivots_only_unreadable_sources_to_html_and_docx() {
        let s = strategy();
        let d = s.descriptor();
        assert!(d.supports(FormatPair::new(Format::Pdf, Format::Html)));
        assert!(d.supports(FormatPair::new(Format::Pptx, Format::Docx)));
        assert!(d.supports(FormatPair::new(Format::Xlsx, Format::Html)));
        assert!(!d.supports(FormatPair::new(Format::Docx, Format::Html)));
        assert!(!d.supports(FormatPair::new(Format::Txt, Format::Docx)));
        assert!(!d.supports(FormatPair::new(Format::Pdf, Format::Pdf)));
        assert!(!d.supports(FormatPair::new(Format::Xlsx, Format::Pdf)));
    }
}
