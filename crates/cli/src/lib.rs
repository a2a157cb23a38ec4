use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duet")]
#[command(about = "Duet - anonymous one-to-one pairing service")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the pairing service with the given configuration
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "duet.yaml", env = "DUET_CONFIG")]
        config: PathBuf,

        /// Override the matching policy from the config file
        #[arg(long, value_enum)]
        policy: Option<PolicyMode>,

        /// Override the sweep interval in milliseconds
        #[arg(long)]
        sweep_interval_ms: Option<u64>,

        /// Enable the Prometheus exporter on this port
        #[arg(long)]
        metrics_port: Option<u16>,
    },

    /// Validate configuration without starting the service
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "duet.yaml", env = "DUET_CONFIG")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "duet.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyMode {
    /// Ignore hard preferences on every attempt
    Relaxed,

    /// Enforce preferences until an entry has waited past the relax threshold
    Strict,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::Relaxed => "relaxed",
            PolicyMode::Strict => "strict",
        }
    }

    /// Value for `matching.always_relaxed`
    pub fn always_relaxed(&self) -> bool {
        matches!(self, PolicyMode::Relaxed)
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_defaults() {
        let cli = Cli::try_parse_from(["duet", "start"]).unwrap();
        match cli.command {
            Commands::Start {
                config,
                policy,
                sweep_interval_ms,
                metrics_port,
            } => {
                // DUET_CONFIG may be set in the environment running the tests
                if std::env::var_os("DUET_CONFIG").is_none() {
                    assert_eq!(config, PathBuf::from("duet.yaml"));
                }
                assert_eq!(policy, None);
                assert_eq!(sweep_interval_ms, None);
                assert_eq!(metrics_port, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_start_overrides() {
        let cli = Cli::try_parse_from([
            "duet",
            "start",
            "-c",
            "conf/prod.yaml",
            "--policy",
            "strict",
            "--sweep-interval-ms",
            "500",
            "--metrics-port",
            "9100",
        ])
        .unwrap();

        match cli.command {
            Commands::Start {
                config,
                policy,
                sweep_interval_ms,
                metrics_port,
            } => {
                assert_eq!(config, PathBuf::from("conf/prod.yaml"));
                assert_eq!(policy, Some(PolicyMode::Strict));
                assert_eq!(sweep_interval_ms, Some(500));
                assert_eq!(metrics_port, Some(9100));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(Cli::try_parse_from(["duet", "start", "--policy", "greedy"]).is_err());
    }

    #[test]
    fn test_policy_mode() {
        assert!(PolicyMode::Relaxed.always_relaxed());
        assert!(!PolicyMode::Strict.always_relaxed());
        assert_eq!(PolicyMode::Strict.as_str(), "strict");
    }

    #[test]
    fn test_init_output() {
        let cli = Cli::try_parse_from(["duet", "init", "--output", "/tmp/duet.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init { output } if output == PathBuf::from("/tmp/duet.yaml")
        ));
    }
}
