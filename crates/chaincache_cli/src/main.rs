//! ChainCache CLI
//!
//! Command-line access to a daemon through the ChainCache client.
//!
//! # Commands
//!
//! - `height` - Print the daemon's chain height
//! - `block` - Fetch and print one block
//! - `sync` - Fill a cache over a height range and report progress

mod commands;
mod transport;

use chaincache_rpc::{Credentials, DaemonClient, RpcConfig, DEFAULT_MAX_REQUESTS_PER_SECOND, DEFAULT_PORT};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use transport::ReqwestClient;

/// ChainCache daemon tools.
#[derive(Parser)]
#[command(name = "chaincache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Full daemon URI; overrides protocol, host and port
    #[arg(global = true, long)]
    uri: Option<String>,

    /// Daemon host
    #[arg(global = true, long, default_value = "localhost")]
    host: String,

    /// Daemon port
    #[arg(global = true, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// RPC username
    #[arg(global = true, long, requires = "password")]
    user: Option<String>,

    /// RPC password
    #[arg(global = true, long, requires = "user")]
    password: Option<String>,

    /// Maximum requests per second (0 for unlimited)
    #[arg(global = true, long, default_value_t = DEFAULT_MAX_REQUESTS_PER_SECOND)]
    rps: u32,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the daemon's chain height
    Height,

    /// Fetch one block with all of its transactions
    Block {
        /// Block height
        height: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Cache every block in a height range
    Sync {
        /// First height
        start: u64,

        /// Last height (inclusive); defaults to the chain tip
        end: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> RpcConfig {
        let mut config = RpcConfig::default()
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_max_requests_per_second(self.rps)
            .with_timeout(Duration::from_secs(self.timeout));
        config.uri = self.uri.clone();
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            config = config.with_credentials(Credentials::new(user, password));
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("ChainCache CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let daemon = DaemonClient::from_config(cli.config(), ReqwestClient::new()?);
    match cli.command {
        Commands::Height => commands::height::run(&daemon)?,
        Commands::Block { height, format } => commands::block::run(&daemon, height, &format)?,
        Commands::Sync { start, end, format } => commands::sync::run(&daemon, start, end, &format)?,
        Commands::Version => {}
    }

    Ok(())
}
