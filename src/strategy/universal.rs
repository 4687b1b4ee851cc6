//! Universal-converter strategy: one engine call per conversion.
//!
//! The served pairs are the engine's readers × writers, minus identities.

use super::{ConversionStrategy, PairPattern, StrategyDescriptor};
use crate::capability::Engine;
use crate::engine::UniversalConverter;
use crate::error::StrategyError;
use crate::format::FormatPair;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub const NAME: &str = "universal";
pub const PRIORITY: u8 = 20;

pub struct UniversalStrategy {
    descriptor: StrategyDescriptor,
    converter: Arc<dyn UniversalConverter>,
}

impl UniversalStrategy {
    pub fn new(converter: Arc<dyn UniversalConverter>) -> Self {
        let pairs = converter
            .readers()
            .iter()
            .flat_map(|&s| converter.writers().iter().map(move |&t| (s, t)))
            .filter(|(s, t)| s != t)
            .map(|(s, t)| PairPattern::exact(s, t))
            .collect();
        Self {
            descriptor: StrategyDescriptor {
                name: NAME,
                priority: PRIORITY,
                pairs,
            },
            converter,
        }
    }
}

#[async_trait]
impl ConversionStrategy for UniversalStrategy {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn engine(&self, _pair: FormatPair) -> Engine {
        Engine::Pandoc
    }

    async fn convert(
        &self,
        input: &Path,
        pair: FormatPair,
        staging: &Path,
    ) -> Result<(), StrategyError> {
        self.converter.convert(input, pair, staging).await?;
        Ok(())
    }
}
