//! Duet CLI and service binary
//!
//! Entry point for the pairing service. Provides commands for
//! initializing, validating, and starting it.

mod shutdown;
mod tasks;

use anyhow::{Context, Result};
use cli::{Cli, Commands, PolicyMode};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use match_engine::{MatchEngine, MatchPolicy, RetrySweeper, SharedMatchEngine};
use observability::{init_from_config, init_logging, EngineGauges, LogFormat};
use shutdown::ShutdownController;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long each background task gets to stop after Ctrl+C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
struct Overrides {
    policy: Option<PolicyMode>,
    sweep_interval_ms: Option<u64>,
    metrics_port: Option<u16>,
}

impl Overrides {
    fn apply(&self, config: &mut MasterConfig) {
        if let Some(policy) = self.policy {
            config.matching.always_relaxed = policy.always_relaxed();
        }
        if let Some(interval_ms) = self.sweep_interval_ms {
            config.sweeper.enabled = true;
            config.sweeper.interval_ms = interval_ms;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.enabled = true;
            config.metrics.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            policy,
            sweep_interval_ms,
            metrics_port,
        } => {
            let overrides = Overrides {
                policy,
                sweep_interval_ms,
                metrics_port,
            };
            start_service(config, overrides).await
        }
        Commands::Validate { config } => {
            init_logging("duet", LogFormat::Pretty, "warn")?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging("duet", LogFormat::Pretty, "warn")?;
            init_command(output)
        }
    }
}

async fn start_service<P: AsRef<Path>>(config_path: P, overrides: Overrides) -> Result<()> {
    let config_path = config_path.as_ref();

    let mut config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    overrides.apply(&mut config);

    init_from_config(&config.service.name, &config.logging)?;
    debug!(?overrides, "CLI overrides applied");

    let report = validate_config(&config);

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start service due to configuration errors");
    }

    let policy = MatchPolicy::from(&config.matching);
    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        always_relaxed = policy.always_relaxed,
        relax_after_ms = config.matching.relax_after_ms,
        retry_cooldown_ms = config.matching.retry_cooldown_ms,
        "Starting pairing service"
    );

    let engine = SharedMatchEngine::new(MatchEngine::with_policy(policy));
    let mut shutdown = ShutdownController::with_ctrl_c();

    shutdown.track(
        "event-logger",
        tasks::spawn_event_logger(&engine, shutdown.child_token()),
    );

    if config.sweeper.enabled {
        let sweeper = RetrySweeper::from_config(engine.clone(), &config.sweeper);
        shutdown.track("retry-sweeper", sweeper.spawn(shutdown.child_token()));
    } else {
        warn!("Retry sweeper disabled; waiting connections are only retried by new arrivals");
    }

    if config.metrics.enabled {
        observability::init_metrics(config.metrics.port)?;
        let gauges = EngineGauges::new(&config.service.name);
        shutdown.track(
            "metrics-publisher",
            tasks::spawn_metrics_publisher(
                engine.clone(),
                gauges,
                Duration::from_millis(config.metrics.publish_interval_ms),
                shutdown.child_token(),
            ),
        );
    }

    info!(tasks = shutdown.task_count(), "Pairing service running, press Ctrl+C to stop");
    shutdown.wait_for_shutdown().await;

    let stats = engine.stats();
    let stragglers = shutdown.drain(SHUTDOWN_GRACE).await;

    info!(
        waiting = stats.waiting_count,
        active_sessions = stats.active_session_count,
        stragglers,
        "Pairing service stopped"
    );
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    let mode = if config.matching.always_relaxed {
        PolicyMode::Relaxed
    } else {
        PolicyMode::Strict
    };

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {} ({})", config.service.name, config.service.environment);
    println!(
        "Matching: {} policy, relax after {} ms, retry cooldown {} ms",
        mode.as_str(),
        config.matching.relax_after_ms,
        config.matching.retry_cooldown_ms
    );
    if config.sweeper.enabled {
        println!("Sweeper: every {} ms", config.sweeper.interval_ms);
    } else {
        println!("Sweeper: disabled");
    }
    if config.metrics.enabled {
        println!("Metrics: port {}", config.metrics.port);
    }

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the matching weights and thresholds to taste");
    println!(
        "  2. Run 'duet validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'duet start --config {:?}' to start the service",
        output_path
    );

    Ok(())
}
