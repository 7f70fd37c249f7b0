use anyhow::{anyhow, Result};
use celo_mcp::celo::network::{self, Network};
use celo_mcp::config::Config;
use celo_mcp::server::CeloMcpServer;
use clap::{Arg, Command};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (important for MCP stdio servers)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("celo-mcp")
        .version("0.1.0")
        .about("MCP server for reading Celo accounts, tokens, blocks and events")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Default network to use (mainnet, alfajores, baklava, custom)"),
        )
        .arg(
            Arg::new("rpc-url")
                .short('r')
                .long("rpc-url")
                .value_name("URL")
                .help("RPC endpoint URL for the default network"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Deadline for a single RPC call, 0 to wait indefinitely"),
        )
        .arg(
            Arg::new("allow-writes")
                .long("allow-writes")
                .help("Allow write operations (transactions)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Handle special commands first
    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(std::path::PathBuf::from)
        .or_else(|| Config::default_config_path().ok().filter(|p| p.exists()));
    let mut config = Config::load_or_default(config_path).await;

    // Override with command line arguments
    if let Some(network) = matches.get_one::<String>("network") {
        config.default_network = network.clone();
    }

    if let Some(rpc_url) = matches.get_one::<String>("rpc-url") {
        let network: Network = config.default_network.parse()?;
        match network {
            Network::Custom => config.custom_network.rpc_url = Some(rpc_url.clone()),
            builtin => {
                config
                    .rpc_overrides
                    .insert(builtin.as_str().to_string(), rpc_url.clone());
            }
        }
    }

    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.rpc.timeout_secs = Some(*timeout);
    }

    if matches.get_flag("allow-writes") {
        config.security.allow_write_operations = true;
    }

    let profile = network::resolve(None, &config)
        .map_err(|e| anyhow!("Invalid network configuration: {}", e))?;

    info!("Starting Celo MCP Server");
    info!(
        "Default network: {} ({}, chain id {})",
        profile.network, profile.rpc_url, profile.chain_id
    );
    info!("RPC timeout: {:?}", config.rpc.timeout());
    if config.rpc.retry.is_enabled() {
        info!("Retrying read calls up to {} times", config.rpc.retry.max_attempts);
    }
    info!(
        "Write operations allowed: {}",
        config.security.allow_write_operations
    );

    let server = CeloMcpServer::new(config);

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
