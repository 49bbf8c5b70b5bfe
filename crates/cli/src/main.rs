//! BugTrack CLI - Main Entry Point
//!
//! Command-line interface for the BugTrack API: report, triage and resolve
//! bugs, manage users and inspect statistics.

use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

use commands::{bug, stats, user};

/// BugTrack CLI - bug tracking from the terminal
#[derive(Parser)]
#[command(name = "bugtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Server address
    #[arg(long, default_value = "http://127.0.0.1:8080", global = true)]
    server_addr: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// API bearer token
    #[arg(long, global = true, env = "BUGTRACK_AUTH_TOKEN")]
    token: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage bugs
    #[command(subcommand)]
    Bug(bug::BugCommands),

    /// Manage users
    #[command(subcommand)]
    User(user::UserCommands),

    /// Show bug statistics
    Stats,

    /// Check server status
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Create client
    let client = client::ApiClient::new(&cli.server_addr, cli.token.clone());

    match cli.command {
        Commands::Bug(cmd) => bug::execute(cmd, client, cli.format).await?,
        Commands::User(cmd) => user::execute(cmd, client, cli.format).await?,
        Commands::Stats => stats::execute(client, cli.format).await?,
        Commands::Status => {
            if client.health_check().await {
                output::print_success(&format!("Server is running at {}", cli.server_addr));
            } else {
                output::print_error(&format!("Server is not responding at {}", cli.server_addr));
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("BugTrack CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Bug tracking from the terminal");
        }
    }

    Ok(())
}
