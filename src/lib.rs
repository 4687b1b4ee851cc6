//! # edgequake-docconv
//!
//! Document-format conversion (PDF, Word, Markdown, HTML, plain text, plus
//! PowerPoint and Excel as sources) behind a small set of operations,
//! served over MCP.
//!
//! The format converters themselves are external engines (markitdown,
//! pandoc, pdfium) or small in-process writers. What this crate owns is the
//! orchestration around them: format detection, request validation, an
//! ordered fallback chain of conversion strategies, and a batch runner that
//! isolates per-file failures.
//!
//! ## Request Flow
//!
//! ```text
//! request (input, target, output?)
//!  │
//!  ├─ 1. Validate  exists, regular file, ≤ MAX_FILE_SIZE
//!  ├─ 2. Detect    extension → Format
//!  ├─ 3. Resolve   output path, create parent directory
//!  ├─ 4. Identity  source == target → byte copy, done
//!  └─ 5. Chain     extraction (30) → universal (20) → direct (10)
//!                  each attempt staged in TEMP_DIR, bounded by a timeout;
//!                  first success is copied to the output path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docconv::{DocumentService, Engines, ServerConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let engines = Engines::from_config(&config);
//!     let service = DocumentService::start(config, engines).await?;
//!
//!     let result = service
//!         .convert_document(Path::new("report.pdf"), "markdown", None)
//!         .await;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library:
//! ```toml
//! edgequake-docconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod capability;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod format;
pub mod inspect;
pub mod mcp;
pub mod progress;
pub mod service;
pub mod status;
pub mod strategy;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, BatchJob, BatchResult, FileOutcome, FileStatus};
pub use capability::{CapabilityMatrix, Engine};
pub use config::{ConfigSummary, ServerConfig, ServerConfigBuilder};
pub use convert::{
    resolve_output_path, ConversionRequest, ConversionResult, ConversionStatus, DocumentConverter,
};
pub use engine::{DocumentExtractor, EngineError, Engines, PdfTextExtractor, UniversalConverter};
pub use error::{ConvertError, ErrorKind, SetupError, StrategyError};
pub use format::{Format, FormatPair};
pub use inspect::{file_info, FileInfo};
pub use progress::{BatchProgress, BatchProgressCallback, NoopBatchProgress};
pub use service::DocumentService;
pub use status::{HealthReport, HealthStatus, SupportedFormats};
pub use strategy::{ConversionStrategy, StrategyChain};
