//! schemaprobe - discover the request schema of an HTTP endpoint

use clap::{Parser, Subcommand};
use tracing::error;

use schemaprobe_config::Config;

mod commands;
mod logging;
mod server;

use commands::{discover_command, init_command, serve_command, status_command};

/// schemaprobe - learn what an API endpoint expects by probing it
#[derive(Parser)]
#[command(name = "schemaprobe")]
#[command(about = "◆ Black-box request schema discovery for HTTP APIs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config
    Init,
    /// Show configuration status
    Status,
    /// Discover the request schema of one endpoint
    Discover {
        /// Target endpoint URL
        #[arg(short, long)]
        url: String,
        /// HTTP method (defaults to the configured method)
        #[arg(short, long)]
        method: Option<String>,
        /// Extra request header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Initial request body as a JSON object
        #[arg(short, long)]
        body: Option<String>,
        /// Iteration budget (defaults to the configured budget)
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Reasoning API key, overrides config and environment
        #[arg(long)]
        api_key: Option<String>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Start the discovery service
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Reasoning API key, overrides config and environment
        #[arg(long)]
        api_key: Option<String>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (verbose, long_running) = match &cli.command {
        Commands::Discover { verbose, .. } | Commands::Serve { verbose, .. } => (*verbose, true),
        _ => (false, false),
    };

    // A broken config is reported by the command itself
    let log_dir = if long_running {
        match Config::load().await {
            Ok(config) if config.logging.to_file => Some(config.log_dir()),
            _ => None,
        }
    } else {
        None
    };
    let guard = logging::init(verbose, log_dir);

    let outcome = match cli.command {
        Commands::Init => init_command().await.map_err(|e| ("Init", e)),
        Commands::Status => status_command().await.map_err(|e| ("Status", e)),
        Commands::Discover {
            url,
            method,
            headers,
            body,
            max_iterations,
            api_key,
            verbose: _,
        } => discover_command(url, method, headers, body, max_iterations, api_key)
            .await
            .map_err(|e| ("Discover", e)),
        Commands::Serve {
            port,
            api_key,
            verbose: _,
        } => serve_command(port, api_key)
            .await
            .map_err(|e| ("Serve", e)),
    };

    if let Err((command, e)) = outcome {
        error!("{} failed: {:#}", command, e);
        // exit skips destructors; flush the log file first
        drop(guard);
        std::process::exit(1);
    }
}
