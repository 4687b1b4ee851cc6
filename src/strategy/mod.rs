//! Conversion strategies and the priority-ordered chain that runs them.
//!
//! ```text
//!  request (source, target)
//!       │
//!       ▼
//!  candidates: strategies that declare the pair AND whose engine is
//!       │      available, highest priority first (stable for ties)
//!       ▼
//!  attempt 1 ──fail──▶ attempt 2 ──fail──▶ … ──▶ StrategyExhausted
//!       │ ok               │ ok
//!       ▼                  ▼
//!  promote staging file to the final output path
//! ```
//!
//! Every attempt writes to its own staging file under
//! [`ServerConfig::temp_dir`]; the final output path is only written after
//! an attempt succeeds, so a failed request never leaves a partial output
//! behind.

pub mod direct;
pub mod extraction;
pub mod universal;

/// Reported as the strategy for same-format requests, which are served by
/// a byte copy instead of the chain.
pub const IDENTITY: &str = "identity";

use crate::capability::{CapabilityMatrix, Engine};
use crate::config::ServerConfig;
use crate::engine::Engines;
use crate::error::{ConvertError, StrategyError};
use crate::format::{Format, FormatPair};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Matches a set of (source, target) pairs. `None` is a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPattern {
    pub source: Option<Format>,
    pub target: Option<Format>,
}

impl PairPattern {
    /// Any source, any target.
    pub fn any() -> Self {
        Self {
            source: None,
            target: None,
        }
    }

    /// Any source, fixed target.
    pub fn to(target: Format) -> Self {
        Self {
            source: None,
            target: Some(target),
        }
    }

    pub fn exact(source: Format, target: Format) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
        }
    }

    pub fn matches(&self, pair: FormatPair) -> bool {
        self.source.map_or(true, |s| s == pair.source)
            && self.target.map_or(true, |t| t == pair.target)
    }
}

/// Static description of a strategy: name, rank, and the pairs it serves.
#[derive(Debug, Clone)]
pub struct StrategyDescriptor {
    pub name: &'static str,
    /// Higher runs first.
    pub priority: u8,
    pub pairs: Vec<PairPattern>,
}

impl StrategyDescriptor {
    pub fn supports(&self, pair: FormatPair) -> bool {
        !pair.is_identity() && self.pairs.iter().any(|p| p.matches(pair))
    }
}

/// One way of turning a source format into a target format.
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    fn descriptor(&self) -> &StrategyDescriptor;

    /// The engine this strategy needs for `pair`.
    fn engine(&self, pair: FormatPair) -> Engine;

    /// Convert `input` into `staging`. Must not touch any other path.
    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        staging: &Path,
    ) -> Result<(), StrategyError>;
}

/// Strategies ordered by descending priority.
#[derive(Clone)]
pub struct StrategyChain {
    strategies: Vec<Arc<dyn ConversionStrategy>>,
}

impl StrategyChain {
    /// Order `strategies` by descending priority. Equal priorities keep
    /// their registration order.
    pub fn new(mut strategies: Vec<Arc<dyn ConversionStrategy>>) -> Self {
        strategies.sort_by(|a, b| b.descriptor().priority.cmp(&a.descriptor().priority));
        Self { strategies }
    }

    /// The three built-in strategies over `engines`.
    pub fn standard(engines: &Engines) -> Self {
        Self::new(vec![
            Arc::new(extraction::ExtractionStrategy::new(engines.extractor.clone())),
            Arc::new(universal::UniversalStrategy::new(engines.universal.clone())),
            Arc::new(direct::DirectStrategy::new(engines.pdf_text.clone())),
        ])
    }

    /// Strategies that would be attempted for `pair`, in order.
    pub fn candidates(
        &self,
        pair: FormatPair,
        caps: &CapabilityMatrix,
    ) -> Vec<&Arc<dyn ConversionStrategy>> {
        self.strategies
            .iter()
            .filter(|s| s.descriptor().supports(pair) && caps.is_available(s.engine(pair)))
            .collect()
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.descriptor().name).collect()
    }

    /// Run the candidates for `pair` in order until one succeeds, then
    /// move its output to `output`. Returns the winning strategy's name.
    ///
    /// # Errors
    /// - [`ConvertError::StrategyExhausted`] when there are no candidates or
    ///   every candidate failed
    /// - [`ConvertError::OutputWriteFailed`] when the staged result cannot be
    ///   copied to `output`
    pub async fn run(
        &self,
        input: &Path,
        pair: FormatPair,
        output: &Path,
        caps: &CapabilityMatrix,
        config: &ServerConfig,
    ) -> Result<&'static str, ConvertError> {
        let candidates = self.candidates(pair, caps);
        debug!(
            "{}: {} candidate(s): {:?}",
            pair,
            candidates.len(),
            candidates
                .iter()
                .map(|s| s.descriptor().name)
                .collect::<Vec<_>>()
        );

        let mut last_error = None;
        for (attempt, strategy) in candidates.iter().copied().enumerate() {
            let name = strategy.descriptor().name;
            let start = Instant::now();

            match attempt_once(&**strategy, input, pair, config).await {
                Ok(staging) => {
                    promote(staging.path(), output).await?;
                    info!(
                        "{} converted via {} in {}ms",
                        pair,
                        name,
                        start.elapsed().as_millis()
                    );
                    return Ok(name);
                }
                Err(e) => {
                    warn!(
                        "Strategy {} failed for {} (attempt {}/{}): {}",
                        name,
                        pair,
                        attempt + 1,
                        candidates.len(),
                        e
                    );
                    last_error = Some(format!("{name}: {e}"));
                }
            }
        }

        Err(ConvertError::StrategyExhausted {
            source_format: pair.source,
            target: pair.target,
            attempts: candidates.len(),
            last_error,
        })
    }
}

impl fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.strategy_names()).finish()
    }
}

/// One bounded attempt into a fresh staging file. The staging file is
/// deleted when the returned handle (or the error path) drops it.
async fn attempt_once(
    strategy: &dyn ConversionStrategy,
    input: &Path,
    pair: FormatPair,
    config: &ServerConfig,
) -> Result<tempfile::NamedTempFile, StrategyError> {
    tokio::fs::create_dir_all(&config.temp_dir).await?;
    let staging = tempfile::Builder::new()
        .prefix("docconv-")
        .suffix(&format!(".{}", pair.target.default_extension()))
        .tempfile_in(&config.temp_dir)?;

    match tokio::time::timeout(
        config.strategy_timeout(),
        strategy.convert(input, pair, staging.path()),
    )
    .await
    {
        Ok(Ok(())) => Ok(staging),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(StrategyError::Timeout {
            secs: config.strategy_timeout_secs,
        }),
    }
}

/// Copy the staged result to its final location. The staging directory may
/// sit on another filesystem, so this is a copy and not a rename.
async fn promote(staging: &Path, output: &Path) -> Result<(), ConvertError> {
    let write_failed = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: output.to_path_buf(),
        source,
    };
    let mut src = tokio::fs::File::open(staging).await.map_err(write_failed)?;
    let mut dst = tokio::fs::File::create(output).await.map_err(write_failed)?;
    tokio::io::copy(&mut src, &mut dst).await.map_err(write_failed)?;
    dst.flush().await.map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(StrategyDescriptor);

    #[async_trait]
    impl ConversionStrategy for Named {
        fn descriptor(&self) -> &StrategyDescriptor {
            &self.0
        }
        fn engine(&self, _pair: FormatPair) -> Engine {
            Engine::MarkdownRenderer
        }
        async fn convert(
            &self,
            _input: &Path,
            _pair: FormatPair,
            _staging: &Path,
        ) -> Result<(), StrategyError> {
            Ok(())
        }
    }

    fn named(name: &'static str, priority: u8) -> Arc<dyn ConversionStrategy> {
        Arc::new(Named(StrategyDescriptor {
            name,
            priority,
            pairs: vec![PairPattern::any()],
        }))
    }

    #[test]
    fn chain_sorts_by_priority_and_keeps_ties_stable() {
        let chain = StrategyChain::new(vec![
            named("low", 1),
            named("tie-a", 5),
            named("high", 9),
            named("tie-b", 5),
        ]);
        assert_eq!(chain.strategy_names(), vec!["high", "tie-a", "tie-b", "low"]);
    }

    #[test]
    fn identity_pairs_are_never_supported() {
        let d = StrategyDescriptor {
            name: "x",
            priority: 1,
            pairs: vec![PairPattern::any()],
        };
        assert!(!d.supports(FormatPair::new(Format::Txt, Format::Txt)));
        assert!(d.supports(FormatPair::new(Format::Txt, Format::Html)));
    }

    #[test]
    fn patterns_match_wildcards() {
        let pair = FormatPair::new(Format::Pdf, Format::Txt);
        assert!(PairPattern::to(Format::Txt).matches(pair));
        assert!(PairPattern::exact(Format::Pdf, Format::Txt).matches(pair));
        assert!(!PairPattern::exact(Format::Docx, Format::Txt).matches(pair));
    }

    #[test]
    fn unavailable_engines_are_filtered() {
        let chain = StrategyChain::new(vec![named("only", 1)]);
        let pair = FormatPair::new(Format::Markdown, Format::Html);
        let off = CapabilityMatrix::from_probes([(Engine::Pandoc, true)]).unwrap();
        assert!(chain.candidates(pair, &off).is_empty());
        let on = CapabilityMatrix::from_probes([(Engine::MarkdownRenderer, true)]).unwrap();
        assert_eq!(chain.candidates(pair, &on).len(), 1);
    }
}
