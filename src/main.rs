mod server;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use server::TenderlyMcpServer;
use std::path::PathBuf;
use tenderly_sdk::{Client, Network, Settings};
use tracing::{error, info};

fn cli() -> Command {
    Command::new("tenderly-mcp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("MCP server for Tenderly project contracts, wallets and simulations")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Settings file; defaults to the path printed by --config-path when present"),
        )
        .arg(
            Arg::new("account")
                .short('a')
                .long("account")
                .value_name("ACCOUNT")
                .help("Tenderly account slug"),
        )
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PROJECT")
                .help("Tenderly project slug"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("CHAIN_ID")
                .value_parser(|raw: &str| raw.parse::<Network>())
                .help("Chain id every request is made on, e.g. 1 or 11155111"),
        )
        .arg(
            Arg::new("allow-writes")
                .long("allow-writes")
                .action(ArgAction::SetTrue)
                .help("Allow add, remove, update and verify"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .action(ArgAction::SetTrue)
                .conflicts_with("config-path")
                .help("Print a sample settings file and exit"),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .action(ArgAction::SetTrue)
                .help("Print the default settings path and exit"),
        )
}

/// Command-line values win over the settings file and the environment.
fn apply_overrides(settings: &mut Settings, matches: &ArgMatches) {
    if let Some(account) = matches.get_one::<String>("account") {
        settings.account.account_name = account.clone();
    }
    if let Some(project) = matches.get_one::<String>("project") {
        settings.account.project_name = project.clone();
    }
    if let Some(network) = matches.get_one::<Network>("network") {
        settings.account.network = *network;
    }
    if matches.get_flag("allow-writes") {
        settings.security.allow_write_operations = true;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = cli().get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Settings::generate_sample());
        return Ok(());
    }
    if matches.get_flag("config-path") {
        println!("{}", Settings::default_config_path()?.display());
        return Ok(());
    }

    let config_path = matches.get_one::<PathBuf>("config");
    let mut settings = Settings::resolve(config_path.map(PathBuf::as_path)).await?;
    apply_overrides(&mut settings, &matches);

    let client = Client::new(settings.to_configuration())?;
    info!(
        "Serving {}/{} on network {} (writes {})",
        settings.account.account_name,
        settings.account.project_name,
        settings.account.network,
        if settings.security.allow_write_operations {
            "allowed"
        } else {
            "disabled"
        }
    );

    TenderlyMcpServer::new(client, settings)
        .run()
        .await
        .inspect_err(|e| error!("Server error: {}", e))
}
