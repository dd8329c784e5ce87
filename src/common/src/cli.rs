use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared across all binaries
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Subcommands that inspect the configuration without touching Artifactory
#[derive(Subcommand, Debug, Clone)]
pub enum CommonCommands {
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use std::collections::HashSet;
    use tracing_subscriber::EnvFilter;

    /// Log level implied by the verbosity flags
    pub fn log_level(args: &CommonArgs) -> &'static str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Initialize logging based on CLI arguments, `RUST_LOG` wins when set
    pub fn init_logging(args: &CommonArgs) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level(args)));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("Artifact Cleanup Configuration:");
            println!("===============================");
            println!("Artifactory URL: {}", config.artifactory.url);
            println!(
                "API key: {}",
                if config.artifactory.api_key.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("Request timeout: {:?}", config.artifactory.timeout);
            println!("AQL include: {}", config.artifactory.include.join(", "));

            println!("Policies: {}", config.policies.len());
            for policy in &config.policies {
                println!("  {} ({} rules)", policy.name, policy.rules.len());
                for rule in &policy.rules {
                    println!("    - {}", rule.rule);
                }
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::info!("Validating configuration...");

        if config.artifactory.url.trim().is_empty() {
            anyhow::bail!("Artifactory URL cannot be empty");
        }

        let mut seen = HashSet::new();
        for policy in &config.policies {
            if policy.name.trim().is_empty() {
                anyhow::bail!("Policy name cannot be empty");
            }
            if !seen.insert(policy.name.as_str()) {
                anyhow::bail!("Duplicate policy name: {}", policy.name);
            }
        }

        log::info!("Configuration validation passed");
        Ok(())
    }

    /// Handle the configuration-only commands
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<()> {
        match command {
            CommonCommands::Config { json } => display_config(config, *json),
            CommonCommands::Validate => validate_config(config),
            CommonCommands::Version => {
                println!("{}", version_info());
                Ok(())
            }
        }
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, PolicyConfig};

    fn args(verbose: bool, quiet: bool) -> CommonArgs {
        CommonArgs {
            config: None,
            verbose,
            quiet,
        }
    }

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(utils::log_level(&args(false, false)), "info");
        assert_eq!(utils::log_level(&args(true, false)), "debug");
        assert_eq!(utils::log_level(&args(true, true)), "warn");
    }

    #[test]
    fn test_version_info() {
        let version = utils::version_info();
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_validate_rejects_duplicate_policies() {
        let mut config = Configuration::default();
        for _ in 0..2 {
            config.policies.push(PolicyConfig {
                name: "snapshots".to_string(),
                rules: vec![],
            });
        }

        let err = utils::validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate policy name"));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config = Configuration::default();
        config.artifactory.url = "  ".to_string();
        assert!(utils::validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(utils::validate_config(&Configuration::default()).is_ok());
    }
}
