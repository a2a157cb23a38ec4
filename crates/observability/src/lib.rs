//! Observability infrastructure for Duet
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - Mirroring of match engine counters into the exporter
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("duet", LogFormat::Pretty, "info")?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9464)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_from_config, init_logging, LogFormat};
pub use metrics::{init_metrics, EngineGauges};
