pub fn default_enabled() -> bool {
    true
}

pub fn default_service_name() -> String {
    "duet".to_string()
}

pub fn default_environment() -> String {
    "development".to_string()
}

pub fn default_relax_after_ms() -> u64 {
    3000
}

pub fn default_retry_cooldown_ms() -> u64 {
    1000
}

pub fn default_always_relaxed() -> bool {
    true
}

pub fn default_strict_base() -> f64 {
    50.0
}

pub fn default_relaxed_base() -> f64 {
    10.0
}

pub fn default_per_shared_interest() -> f64 {
    10.0
}

pub fn default_max_wait_bonus() -> f64 {
    20.0
}

pub fn default_flat_bonus() -> f64 {
    1.0
}

pub fn default_sweep_interval_ms() -> u64 {
    2000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9464
}

pub fn default_metrics_publish_interval_ms() -> u64 {
    5000
}

/// Accepted values for `logging.format`
pub const LOG_FORMATS: &[&str] = &["pretty", "json", "compact"];
