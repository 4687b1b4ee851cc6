//! Fake engines and service builders shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_docconv::{
    CapabilityMatrix, DocumentExtractor, DocumentService, Engine, EngineError, Engines, Format,
    FormatPair, PdfTextExtractor, ServerConfig, StrategyChain, UniversalConverter,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install a test log subscriber once per test binary.
///
/// Failed strategy attempts log at `warn`, so they show up in the output
/// of a failing test. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// What a fake engine does when called.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed(String),
    Fail(String),
    Hang,
}

async fn act(engine: &'static str, behaviour: &Behaviour) -> Result<String, EngineError> {
    match behaviour {
        Behaviour::Succeed(text) => Ok(text.clone()),
        Behaviour::Fail(msg) => Err(EngineError::ProcessFailed {
            engine,
            status: "exit status: 1".into(),
            stderr: msg.clone(),
        }),
        Behaviour::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }
}

pub struct FakeExtractor {
    pub behaviour: Behaviour,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake-extractor"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn extract(&self, _input: &Path) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        act("fake-extractor", &self.behaviour).await
    }
}

/// Universal converter that writes `"<behaviour text> (<pair>)"` to the
/// output path.
pub struct FakeUniversal {
    pub behaviour: Behaviour,
    pub calls: AtomicUsize,
}

impl FakeUniversal {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

const READERS: &[Format] = &[Format::Markdown, Format::Html, Format::Docx, Format::Txt];
const WRITERS: &[Format] = &[
    Format::Markdown,
    Format::Html,
    Format::Docx,
    Format::Txt,
    Format::Pdf,
];

#[async_trait]
impl UniversalConverter for FakeUniversal {
    fn name(&self) -> &str {
        "fake-universal"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn readers(&self) -> &[Format] {
        READERS
    }

    fn writers(&self) -> &[Format] {
        WRITERS
    }

    async fn convert(
        &self,
        _input: &Path,
        pair: FormatPair,
        output: &Path,
    ) -> Result<(), EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = act("fake-universal", &self.behaviour).await?;
        std::fs::write(output, format!("{text} ({pair})")).map_err(|e| EngineError::Io {
            engine: "fake-universal",
            source: e,
        })
    }
}

pub struct FakePdf {
    pub pages: Vec<String>,
}

#[async_trait]
impl PdfTextExtractor for FakePdf {
    fn name(&self) -> &str {
        "fake-pdf"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn page_texts(&self, _input: &Path) -> Result<Vec<String>, EngineError> {
        Ok(self.pages.clone())
    }
}

pub struct Harness {
    pub extractor: Arc<FakeExtractor>,
    pub universal: Arc<FakeUniversal>,
    pub service: DocumentService,
    /// Staging directory; should be empty between requests.
    pub staging: tempfile::TempDir,
}

/// Build a service over fake engines. `available` lists the engines the
/// capability matrix reports as usable.
pub fn harness(
    extractor: Behaviour,
    universal: Behaviour,
    pages: &[&str],
    available: &[Engine],
    max_file_size: u64,
) -> Harness {
    init_tracing();
    let staging = tempfile::tempdir().unwrap();
    let config = ServerConfig::builder()
        .temp_dir(staging.path())
        .max_file_size(max_file_size)
        .strategy_timeout_secs(1)
        .batch_concurrency(3)
        .build()
        .unwrap();

    let extractor = FakeExtractor::new(extractor);
    let universal = FakeUniversal::new(universal);
    let engines = Engines {
        extractor: extractor.clone(),
        universal: universal.clone(),
        pdf_text: Arc::new(FakePdf {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }),
    };
    let caps = CapabilityMatrix::from_probes(available.iter().map(|e| (*e, true))).unwrap();
    let service = DocumentService::new(
        Arc::new(config),
        Arc::new(caps),
        StrategyChain::standard(&engines),
    );

    Harness {
        extractor,
        universal,
        service,
        staging,
    }
}

/// Only the in-process engines.
pub fn builtin_only() -> Harness {
    harness(
        Behaviour::Fail("unused".into()),
        Behaviour::Fail("unused".into()),
        &[],
        &[Engine::DocxWriter, Engine::MarkdownRenderer],
        1024 * 1024,
    )
}

pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
