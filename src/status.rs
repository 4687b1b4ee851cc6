//! Health and capability reporting.
//!
//! Pure reads over the configuration, capability matrix, and strategy
//! chain; nothing here performs I/O or re-probes engines.

use crate::capability::CapabilityMatrix;
use crate::config::{ConfigSummary, ServerConfig};
use crate::format::{Format, FormatPair};
use crate::strategy::StrategyChain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every engine is available.
    Healthy,
    /// At least one engine is unavailable; some pairs may be unreachable.
    Degraded,
}

/// One reachable (source, target) pair and the strategies that would be
/// tried for it, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub source: Format,
    pub target: Format,
    pub strategies: Vec<String>,
}

/// What this process can convert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedFormats {
    pub inputs: Vec<Format>,
    pub outputs: Vec<Format>,
    /// Format name → recognised extensions (with dots).
    pub extensions: BTreeMap<String, Vec<String>>,
    pub engines: BTreeMap<String, bool>,
    pub routes: Vec<Route>,
}

impl SupportedFormats {
    pub fn build(chain: &StrategyChain, caps: &CapabilityMatrix) -> Self {
        let routes: Vec<Route> = Format::ALL
            .into_iter()
            .flat_map(|s| Format::TARGETS.into_iter().map(move |t| FormatPair::new(s, t)))
            .filter(|pair| !pair.is_identity())
            .filter_map(|pair| {
                let strategies: Vec<String> = chain
                    .candidates(pair, caps)
                    .iter()
                    .map(|s| s.descriptor().name.to_string())
                    .collect();
                (!strategies.is_empty()).then(|| Route {
                    source: pair.source,
                    target: pair.target,
                    strategies,
                })
            })
            .collect();

        Self {
            inputs: Format::ALL.to_vec(),
            outputs: Format::TARGETS.to_vec(),
            extensions: Format::ALL
                .into_iter()
                .map(|f| {
                    let exts = f.extensions().iter().map(|e| format!(".{e}")).collect();
                    (f.name().to_string(), exts)
                })
                .collect(),
            engines: engine_map(caps),
            routes,
        }
    }
}

/// Result of the `health_check` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub engines: BTreeMap<String, bool>,
    pub config: ConfigSummary,
    pub supported_formats: SupportedFormats,
}

impl HealthReport {
    pub fn build(config: &ServerConfig, caps: &CapabilityMatrix, chain: &StrategyChain) -> Self {
        Self {
            status: if caps.all_available() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            engines: engine_map(caps),
            config: ConfigSummary::from(config),
            supported_formats: SupportedFormats::build(chain, caps),
        }
    }
}

fn engine_map(caps: &CapabilityMatrix) -> BTreeMap<String, bool> {
    caps.iter().map(|(e, v)| (e.name().to_string(), v)).collect()
}
