use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing::error;

use pack109_protocol::config::{with_default_port, NetworkConfig};
use pack109_protocol::error::Result;
use pack109_protocol::protocol::message::Message;
use pack109_protocol::service::Client;
use pack109_protocol::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "pack109-client")]
#[command(about = "Send or fetch a file from a pack109 server")]
#[command(version)]
#[command(group(ArgGroup::new("action").required(true).args(["send", "request"])))]
struct Cli {
    /// Server address, as host or host:port
    #[arg(long)]
    hostname: Option<String>,

    /// Local file to upload
    #[arg(long)]
    send: Option<PathBuf>,

    /// Name of a stored file to download
    #[arg(long)]
    request: Option<String>,

    /// Directory for downloaded files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<NetworkConfig> {
    let mut config = match &cli.config {
        Some(path) => NetworkConfig::from_file(path)?,
        None => NetworkConfig::default(),
    };
    config.apply_env()?;

    if let Some(hostname) = &cli.hostname {
        config.client.address = with_default_port(hostname);
    }
    if let Some(dir) = &cli.output {
        config.client.download_dir = dir.clone();
    }

    config.validate_strict()?;
    Ok(config)
}

async fn run(cli: &Cli, client: &Client) -> Result<bool> {
    if let Some(path) = &cli.send {
        let status = client.send_file(path).await?;
        println!("{} {}", status.code, status.message);
        return Ok(status.is_ok());
    }

    let Some(name) = &cli.request else {
        return Ok(false);
    };
    match client.request_file(name).await? {
        Message::File(file) => {
            let path = client.save_file(&file).await?;
            println!("Saved {} ({} bytes)", path.display(), file.data.len());
            Ok(true)
        }
        Message::Status(status) => {
            println!("{} {}", status.code, status.message);
            Ok(status.is_ok())
        }
        Message::Request(_) => Ok(false),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pack109-client: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("pack109-client: {e}");
        return ExitCode::FAILURE;
    }

    let client = Client::new(&config.client, &config.transport);
    match run(&cli, &client).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, address = client.address(), "Request failed");
            ExitCode::FAILURE
        }
    }
}
