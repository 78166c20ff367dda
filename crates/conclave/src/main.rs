// SPDX-FileCopyrightText: 2026 Conclave Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conclave - cost-aware multi-agent routing.
//!
//! This is the binary entry point. Every subcommand reads JSON inputs and
//! prints a JSON result on stdout.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use conclave_config::ConclaveConfig;
use conclave_config::model::LoggingConfig;
use conclave_core::{AgentProfile, ConclaveError, ExpertResponse};

use crate::commands::{RouteArgs, SelectArgs};

/// Conclave - cost-aware multi-agent routing.
#[derive(Parser, Debug)]
#[command(name = "conclave", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Score the complexity of a query.
    Score {
        query: String,
        /// JSON array of prior messages, oldest first.
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
    },
    /// Pick a model tier for a query.
    Route {
        query: String,
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
        /// Use this tier regardless of complexity.
        #[arg(long)]
        force_tier: Option<String>,
        /// Never route above this tier.
        #[arg(long)]
        max_tier: Option<String>,
        /// Remaining budget in USD; below one cent routes to the cheapest tier.
        #[arg(long)]
        budget_remaining: Option<f64>,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "default")]
        team: String,
        /// Expected completion length used for the cost estimate.
        #[arg(long, default_value_t = 500)]
        output_tokens: u32,
    },
    /// Rank a roster of agents for a task and select experts.
    Select {
        /// JSON array of agent profiles.
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,
        #[arg(long)]
        task: String,
        /// Required skills, comma separated.
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
        /// Task type used for personality fit (creative, analytical, collaborative).
        #[arg(long)]
        task_type: Option<String>,
        /// top_1, top_k, ensemble or cascade.
        #[arg(long, default_value = "top_1")]
        strategy: String,
        #[arg(long)]
        k: Option<usize>,
        /// Minimum overall score (0-10).
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Merge expert responses into one answer.
    Aggregate {
        /// JSON array of expert responses.
        #[arg(long, value_name = "FILE")]
        responses: PathBuf,
        /// weighted_average, consensus or synthesis.
        #[arg(long)]
        method: Option<String>,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => conclave_config::load_and_validate_path(path),
        None => conclave_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            conclave_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);

    match run(cli.command, &config).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("conclave: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: &ConclaveConfig) -> Result<String, ConclaveError> {
    let value = match command {
        Commands::Score { query, history } => {
            let history = read_history(history.as_deref())?;
            commands::score(config, &query, &history).await?
        }
        Commands::Route {
            query,
            history,
            force_tier,
            max_tier,
            budget_remaining,
            user,
            team,
            output_tokens,
        } => {
            let history = read_history(history.as_deref())?;
            let args = RouteArgs {
                query: &query,
                history: &history,
                force_tier: force_tier.as_deref(),
                max_tier: max_tier.as_deref(),
                budget_remaining,
                user_id: &user,
                team_id: &team,
                output_tokens,
            };
            commands::route(config, &args).await?
        }
        Commands::Select {
            roster,
            task,
            skills,
            task_type,
            strategy,
            k,
            threshold,
        } => {
            let roster: Vec<AgentProfile> = commands::read_json(&roster)?;
            let args = SelectArgs {
                task: &task,
                skills: &skills,
                task_type: task_type.as_deref(),
                strategy: &strategy,
                k,
                threshold,
            };
            commands::select(config, &roster, &args)?
        }
        Commands::Aggregate { responses, method } => {
            let responses: Vec<ExpertResponse> = commands::read_json(&responses)?;
            commands::aggregate(config, &responses, method.as_deref())?
        }
        Commands::Config => return commands::show_config(config),
    };

    serde_json::to_string_pretty(&value).map_err(|e| ConclaveError::Internal(e.to_string()))
}

fn read_history(path: Option<&Path>) -> Result<Vec<String>, ConclaveError> {
    path.map_or_else(|| Ok(Vec::new()), commands::read_json)
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("conclave={},warn", logging.level)));

    // Logs go to stderr so stdout stays parseable JSON.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
