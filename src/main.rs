mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod credentials;
mod error;
mod models;
mod session;

use std::io;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;
use crate::session::Session;

/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli).await {
        debug!(error = ?e, "command failed");
        eprintln!("Error: {}", error::user_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_args(&cli.global)?;
    let mut session = Session::start(config)?;

    match &cli.command {
        Commands::Login => commands::auth::login(&mut session).await,
        Commands::Logout => commands::auth::logout(&mut session),
        Commands::Deployments => commands::deployments::list(&mut session).await,
        Commands::DeploymentLogs { deployment_id } => {
            commands::deployments::logs(&mut session, deployment_id).await
        }
        Commands::DeploymentFollow => commands::deployments::follow(&mut session).await,
        Commands::Deploy {
            archive,
            git_ref,
            war,
        } => commands::deploy::run(&mut session, archive, git_ref.as_deref(), *war).await,
    }
}
