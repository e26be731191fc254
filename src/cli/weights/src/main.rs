use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg, SubCommand};
use stake_weights::{
    repositories::postgres::{create_pool, PostgresConfig, PostgresStakeSnapshot},
    services::allocation::AllocationService,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::WeightCommands;
use config::{Config, DATABASE_URL_ENV};

fn build_app() -> App<'static, 'static> {
    App::new("Subnet Weights CLI")
        .version("0.1")
        .about("Blend delegator subnet weights into a validator allocation")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("database-url")
                .short("d")
                .long("database-url")
                .value_name("URL")
                .help("Postgres connection string (overrides config and DATABASE_URL)")
                .takes_value(true),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show the current stake-weighted subnet averages"),
        )
        .subcommand(
            SubCommand::with_name("blend")
                .about("Blend a new vector into the stake without declared weights")
                .arg(
                    Arg::with_name("netuids")
                        .short("n")
                        .long("netuids")
                        .value_name("LIST")
                        .help("Comma-separated netuids (prompted when omitted)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("weights")
                        .short("w")
                        .long("weights")
                        .value_name("LIST")
                        .help("Comma-separated fractions summing to 1 (prompted when omitted)")
                        .takes_value(true),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = build_app().get_matches();

    let config = Config::load()?;
    let database_url = config
        .resolve_database_url(matches.value_of("database-url"))
        .ok_or_else(|| anyhow!("No database url: pass --database-url or set {}", DATABASE_URL_ENV))?;

    let pool = create_pool(&PostgresConfig {
        connection_string: database_url,
        max_connections: config.max_connections,
    })
    .await?;
    tracing::info!("Connected to the delegation database");

    let service = AllocationService::new(Arc::new(PostgresStakeSnapshot::new(pool)));

    match matches.subcommand() {
        ("show", Some(_)) => WeightCommands::show(&service).await?,
        ("blend", Some(sub)) => {
            WeightCommands::blend(&service, sub.value_of("netuids"), sub.value_of("weights")).await?
        }
        _ => {
            println!("{}", matches.usage());
            println!("No subcommand specified. Use --help for usage information.");
        }
    }

    Ok(())
}
