use crate::*;
use thiserror::Error;

/// Relax thresholds above this are reported as suspicious
const LONG_RELAX_THRESHOLD_MS: u64 = 60_000;

/// Upper bound for every `*_ms` setting (one day)
pub const MAX_DURATION_MS: u64 = 86_400_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} must not be negative, got {value}")]
    NegativeWeight { field: String, value: f64 },

    #[error("{field} must be at most {max} ms, got {value}")]
    DurationOutOfRange { field: String, value: u64, max: u64 },

    #[error("{field} must be positive, got {value}")]
    InvalidPositiveFloat { field: String, value: f64 },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Log level is required")]
    MissingLogLevel,

    #[error("Metrics port must be non-zero when metrics are enabled")]
    InvalidMetricsPort,

    #[error("Environment variable placeholder in '{field}' was not resolved: {value}")]
    UnresolvedEnvVar { field: String, value: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(&config.service, &mut report);
    validate_matching(&config.matching, &config.sweeper, &mut report);
    validate_sweeper(&config.sweeper, &mut report);
    validate_logging(&config.logging, &mut report);
    validate_metrics(&config.metrics, &mut report);

    report
}

fn check_resolved(field: &str, value: &str, report: &mut ValidationReport) {
    if has_unresolved_env_vars(value) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_duration(field: &str, value: u64, report: &mut ValidationReport) {
    if value > MAX_DURATION_MS {
        report.add_error(ValidationError::DurationOutOfRange {
            field: field.to_string(),
            value,
            max: MAX_DURATION_MS,
        });
    }
}

fn validate_service(service: &ServiceConfig, report: &mut ValidationReport) {
    if service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }
    check_resolved("service.name", &service.name, report);
    check_resolved("service.environment", &service.environment, report);
}

fn validate_matching(matching: &MatchingConfig, sweeper: &SweeperConfig, report: &mut ValidationReport) {
    check_duration("matching.relax_after_ms", matching.relax_after_ms, report);
    check_duration("matching.retry_cooldown_ms", matching.retry_cooldown_ms, report);

    let weights = &matching.weights;
    let non_negative = [
        ("matching.weights.strict_base", weights.strict_base),
        ("matching.weights.relaxed_base", weights.relaxed_base),
        ("matching.weights.max_wait_bonus", weights.max_wait_bonus),
        ("matching.weights.flat_bonus", weights.flat_bonus),
    ];
    for (field, value) in non_negative {
        if value < 0.0 || value.is_nan() {
            report.add_error(ValidationError::NegativeWeight {
                field: field.to_string(),
                value,
            });
        }
    }

    // Every shared interest has to move the score
    if weights.per_shared_interest.is_nan() || weights.per_shared_interest <= 0.0 {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "matching.weights.per_shared_interest".to_string(),
            value: weights.per_shared_interest,
        });
    }

    if weights.strict_base < weights.relaxed_base {
        report.add_warning(
            "matching.weights",
            "strict_base is lower than relaxed_base; strict pairings will rank below relaxed ones",
        );
    }

    if sweeper.enabled && matching.retry_cooldown_ms > sweeper.interval_ms {
        report.add_warning(
            "matching.retry_cooldown_ms",
            "retry cooldown is longer than the sweep interval; some sweeps will skip waiting connections",
        );
    }

    if !matching.always_relaxed {
        if matching.relax_after_ms > LONG_RELAX_THRESHOLD_MS {
            report.add_warning(
                "matching.relax_after_ms",
                "strict matching for over a minute may leave connections waiting a long time",
            );
        }
        if !sweeper.enabled {
            report.add_warning(
                "sweeper.enabled",
                "with strict matching and no sweeper, waiting connections are only retried by new arrivals",
            );
        }
    }
}

fn validate_sweeper(sweeper: &SweeperConfig, report: &mut ValidationReport) {
    if !sweeper.enabled {
        return;
    }
    if sweeper.interval_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "sweeper.interval_ms".to_string(),
        });
    }
    check_duration("sweeper.interval_ms", sweeper.interval_ms, report);
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    if logging.level.trim().is_empty() {
        report.add_error(ValidationError::MissingLogLevel);
    }
    check_resolved("logging.level", &logging.level, report);

    if !LOG_FORMATS.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }
}

fn validate_metrics(metrics: &MetricsConfig, report: &mut ValidationReport) {
    if !metrics.enabled {
        return;
    }
    if metrics.port == 0 {
        report.add_error(ValidationError::InvalidMetricsPort);
    }
    if metrics.publish_interval_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "metrics.publish_interval_ms".to_string(),
        });
    }
    check_duration("metrics.publish_interval_ms", metrics.publish_interval_ms, report);
}
