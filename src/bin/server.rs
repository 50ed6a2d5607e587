use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use pack109_protocol::config::{with_default_port, NetworkConfig};
use pack109_protocol::error::Result;
use pack109_protocol::service::start_server;
use pack109_protocol::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "pack109-server")]
#[command(about = "Store and serve files over the pack109 protocol")]
#[command(version)]
struct Cli {
    /// Address to listen on, as host or host:port
    #[arg(long)]
    hostname: Option<String>,

    /// Snapshot file used to persist stored files
    #[arg(long)]
    persist: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(cli: &Cli) -> Result<NetworkConfig> {
    let mut config = match &cli.config {
        Some(path) => NetworkConfig::from_file(path)?,
        None => NetworkConfig::default(),
    };
    config.apply_env()?;

    if let Some(hostname) = &cli.hostname {
        config.server.address = with_default_port(hostname);
    }
    if let Some(path) = &cli.persist {
        config.server.persist_path = Some(path.clone());
    }

    config.validate_strict()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.print_config {
        println!("{}", NetworkConfig::example_config());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pack109-server: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("pack109-server: {e}");
        return ExitCode::FAILURE;
    }

    match start_server(&config).await {
        Ok(store) => {
            info!(files = store.len(), "Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
