//! Configuration for Duet
//!
//! One YAML document, every section optional. Missing sections and fields
//! fall back to the values in [`defaults`].

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MasterConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
        }
    }
}

/// Pairing policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Wait (ms) after which preference filters stop applying
    #[serde(default = "default_relax_after_ms")]
    pub relax_after_ms: u64,
    /// Minimum gap (ms) between two sweep attempts for one connection
    #[serde(default = "default_retry_cooldown_ms")]
    pub retry_cooldown_ms: u64,
    /// Skip preference filters on every attempt, not only after `relax_after_ms`
    #[serde(default = "default_always_relaxed")]
    pub always_relaxed: bool,
    #[serde(default)]
    pub weights: ScoreWeightsConfig,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            relax_after_ms: default_relax_after_ms(),
            retry_cooldown_ms: default_retry_cooldown_ms(),
            always_relaxed: default_always_relaxed(),
            weights: ScoreWeightsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoreWeightsConfig {
    #[serde(default = "default_strict_base")]
    pub strict_base: f64,
    #[serde(default = "default_relaxed_base")]
    pub relaxed_base: f64,
    #[serde(default = "default_per_shared_interest")]
    pub per_shared_interest: f64,
    #[serde(default = "default_max_wait_bonus")]
    pub max_wait_bonus: f64,
    #[serde(default = "default_flat_bonus")]
    pub flat_bonus: f64,
}

impl Default for ScoreWeightsConfig {
    fn default() -> Self {
        Self {
            strict_base: default_strict_base(),
            relaxed_base: default_relaxed_base(),
            per_shared_interest: default_per_shared_interest(),
            max_wait_bonus: default_max_wait_bonus(),
            flat_bonus: default_flat_bonus(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_sweep_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// pretty | json | compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    /// How often engine gauges are refreshed
    #[serde(default = "default_metrics_publish_interval_ms")]
    pub publish_interval_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            publish_interval_ms: default_metrics_publish_interval_ms(),
        }
    }
}
