//! The operation surface: the five operations exposed to callers.
//!
//! [`DocumentService`] owns the shared, read-only state (configuration,
//! capability matrix, strategy chain) and is what transports such as the
//! MCP server call into. Every operation returns data; a failed request is
//! a result with an error kind, never a panic or an aborted call.

use crate::batch::{run_batch, BatchJob, BatchResult};
use crate::capability::CapabilityMatrix;
use crate::config::ServerConfig;
use crate::convert::{ConversionRequest, ConversionResult, DocumentConverter};
use crate::engine::Engines;
use crate::error::{ConvertError, SetupError};
use crate::format::Format;
use crate::inspect::{file_info, FileInfo};
use crate::progress::BatchProgress;
use crate::status::{HealthReport, SupportedFormats};
use crate::strategy::StrategyChain;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DocumentService {
    converter: DocumentConverter,
}

impl DocumentService {
    /// Probe `engines` and build the service.
    ///
    /// # Errors
    /// [`SetupError::NoEnginesAvailable`] when no engine can be used.
    pub async fn start(config: ServerConfig, engines: Engines) -> Result<Self, SetupError> {
        let caps = CapabilityMatrix::probe(&engines, &config).await?;
        info!(
            "Capabilities: {}",
            caps.iter()
                .map(|(e, ok)| format!("{}={}", e, if ok { "yes" } else { "no" }))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self::new(
            Arc::new(config),
            Arc::new(caps),
            StrategyChain::standard(&engines),
        ))
    }

    /// Build from an already probed matrix and an explicit chain.
    pub fn new(
        config: Arc<ServerConfig>,
        capabilities: Arc<CapabilityMatrix>,
        chain: StrategyChain,
    ) -> Self {
        Self {
            converter: DocumentConverter::new(config, capabilities, chain),
        }
    }

    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    pub fn config(&self) -> &ServerConfig {
        self.converter.config()
    }

    /// Convert one document to the format named by `target_format`.
    pub async fn convert_document(
        &self,
        input_path: &Path,
        target_format: &str,
        output_path: Option<&Path>,
    ) -> ConversionResult {
        let target = match target_format.parse::<Format>() {
            Ok(t) => t,
            Err(e) => return ConversionResult::failed(&e, 0),
        };
        let mut request = ConversionRequest::new(input_path, target);
        if let Some(out) = output_path {
            request = request.with_output(out);
        }
        self.converter.convert(&request).await
    }

    pub fn list_supported_formats(&self) -> SupportedFormats {
        SupportedFormats::build(self.converter.chain(), self.converter.capabilities())
    }

    pub async fn get_file_info(&self, path: &Path) -> Result<FileInfo, ConvertError> {
        file_info(path, self.converter.config()).await
    }

    /// Convert every matching file in `input_dir`.
    ///
    /// `output_dir` defaults to `<input_dir>/converted_<format>` and
    /// `pattern` to `*`.
    pub async fn batch_convert(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        target_format: &str,
        pattern: Option<&str>,
        progress: Option<&BatchProgress>,
    ) -> Result<BatchResult, ConvertError> {
        let target: Format = target_format.parse()?;
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| BatchJob::default_output_dir(input_dir, target));
        let mut job = BatchJob::new(input_dir, output_dir, target);
        if let Some(p) = pattern {
            job = job.with_pattern(p);
        }
        run_batch(&self.converter, &job, progress).await
    }

    pub fn health_check(&self) -> HealthReport {
        HealthReport::build(
            self.converter.config(),
            self.converter.capabilities(),
            self.converter.chain(),
        )
    }
}
