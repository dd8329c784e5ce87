use anyhow::{Context, Result};
use artifactory_client::ArtifactoryClient;
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use common::config::Configuration;
use rules::{ArtifactStore, CleanupPolicy, registry};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "artifact-cleanup")]
#[command(about = "Decide which Artifactory artifacts are eligible for deletion")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the artifacts each policy would delete (default)
    Plan {
        #[arg(long, help = "Only run the policy with this name")]
        policy: Option<String>,

        #[arg(long, help = "Print the plan in JSON format")]
        json: bool,
    },
    #[command(flatten)]
    Common(CommonCommands),
}

impl Default for Commands {
    fn default() -> Self {
        Self::Plan {
            policy: None,
            json: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct PolicyPlan {
    policy: String,
    query: String,
    artifacts: Vec<rules::ArtifactRecord>,
}

fn select_policies(config: &Configuration, only: Option<&str>) -> Result<Vec<CleanupPolicy>> {
    let selected: Vec<_> = match only {
        Some(name) => vec![
            config
                .policy(name)
                .with_context(|| format!("No policy named {name}"))?,
        ],
        None => config.policies.iter().collect(),
    };

    selected
        .into_iter()
        .map(|policy| {
            registry::build_policy(policy)
                .map(|p| p.with_include(config.artifactory.include.clone()))
                .with_context(|| format!("Invalid policy {}", policy.name))
        })
        .collect()
}

async fn plan(policies: &[CleanupPolicy], store: &dyn ArtifactStore) -> Result<Vec<PolicyPlan>> {
    let mut plans = Vec::with_capacity(policies.len());
    for policy in policies {
        let outcome = policy.execute(store).await?;
        plans.push(PolicyPlan {
            policy: policy.name().to_string(),
            query: outcome.query.to_string(),
            artifacts: outcome.candidates.into_vec(),
        });
    }
    Ok(plans)
}

fn print_plans(plans: &[PolicyPlan], json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(plans).context("Failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    for plan in plans {
        println!("Policy: {}", plan.policy);
        println!("Query: {}", plan.query);
        for artifact in &plan.artifacts {
            println!("  {}", artifact.full_path());
        }
        println!("{} artifacts eligible for deletion", plan.artifacts.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(&cli.common);

    let config = utils::load_config(cli.common.config.as_ref())?;

    let (only, json) = match cli.command.unwrap_or_default() {
        Commands::Common(command) => return utils::handle_common_command(&command, &config),
        Commands::Plan { policy, json } => (policy, json),
    };

    utils::validate_config(&config)?;
    let policies = select_policies(&config, only.as_deref())?;
    if policies.is_empty() {
        log::warn!("No policies configured");
        return Ok(());
    }

    let client = ArtifactoryClient::new(&config.artifactory)
        .context("Failed to create Artifactory client")?;
    log::info!("Using Artifactory at {}", client.base_url());

    let plans = plan(&policies, &client).await?;
    print_plans(&plans, json)
}
