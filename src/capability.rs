//! Capability matrix: which engines are usable in this process.
//!
//! Probed once at startup and immutable afterwards. Strategies whose engine
//! is unavailable are skipped by the chain without being attempted.

use crate::config::ServerConfig;
use crate::engine::{self, Engines};
use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// A conversion engine known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    Markitdown,
    Pandoc,
    Pdfium,
    DocxWriter,
    MarkdownRenderer,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::Markitdown,
        Engine::Pandoc,
        Engine::Pdfium,
        Engine::DocxWriter,
        Engine::MarkdownRenderer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Engine::Markitdown => "markitdown",
            Engine::Pandoc => "pandoc",
            Engine::Pdfium => "pdfium",
            Engine::DocxWriter => "docx-writer",
            Engine::MarkdownRenderer => "markdown-renderer",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability of every [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityMatrix {
    engines: BTreeMap<Engine, bool>,
}

impl CapabilityMatrix {
    /// Probe every engine once.
    ///
    /// pandoc is reported unavailable without probing when
    /// [`ServerConfig::enable_pandoc`] is false.
    ///
    /// # Errors
    /// [`SetupError::NoEnginesAvailable`] if no engine at all can be used.
    pub async fn probe(engines: &Engines, config: &ServerConfig) -> Result<Self, SetupError> {
        let pandoc = async {
            if config.enable_pandoc {
                Some(engines.universal.probe().await)
            } else {
                None
            }
        };
        let (markitdown, pandoc, pdfium) =
            tokio::join!(engines.extractor.probe(), pandoc, engines.pdf_text.probe());

        let mut probes = Vec::with_capacity(Engine::ALL.len());
        let mut record = |engine: Engine, result: Result<(), engine::EngineError>| match result {
            Ok(()) => {
                info!("Engine {} available", engine);
                probes.push((engine, true));
            }
            Err(e) => {
                warn!("Engine {} unavailable: {}", engine, e);
                probes.push((engine, false));
            }
        };

        record(Engine::Markitdown, markitdown);
        match pandoc {
            Some(result) => record(Engine::Pandoc, result),
            None => info!("Engine {} disabled by configuration", Engine::Pandoc),
        }
        record(Engine::Pdfium, pdfium);
        record(Engine::DocxWriter, engine::docx::probe());
        record(
            Engine::MarkdownRenderer,
            if engine::markdown::probe() {
                Ok(())
            } else {
                Err(engine::EngineError::InvalidOutput {
                    engine: "markdown-renderer",
                    detail: "render check failed".into(),
                })
            },
        );

        Self::from_probes(probes)
    }

    /// Build a matrix from explicit probe results. Engines not listed are
    /// unavailable.
    pub fn from_probes(
        probes: impl IntoIterator<Item = (Engine, bool)>,
    ) -> Result<Self, SetupError> {
        let mut engines: BTreeMap<Engine, bool> =
            Engine::ALL.into_iter().map(|e| (e, false)).collect();
        engines.extend(probes);
        if !engines.values().any(|v| *v) {
            return Err(SetupError::NoEnginesAvailable);
        }
        Ok(Self { engines })
    }

    pub fn is_available(&self, engine: Engine) -> bool {
        self.engines.get(&engine).copied().unwrap_or(false)
    }

    /// True when every known engine probed successfully.
    pub fn all_available(&self) -> bool {
        self.engines.values().all(|v| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Engine, bool)> + '_ {
        self.engines.iter().map(|(e, v)| (*e, *v))
    }
}
