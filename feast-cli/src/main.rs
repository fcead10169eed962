//! # Feast CLI Entry Point
//!
//! The main executable of `feast-cli`. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the log subscriber.
//! 2. **Connection**: Builds a [`FeastClient`] for the target serving deployment.
//! 3. **Execution**: Runs the requested command.
//! 4. **Presentation**: Prints the result as JSON to standard output, or the error to standard error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, EntityValue};
use feast_client::{BearerToken, FeastClient, Row, SecurityConfig};
use formatter::{FormattedString, RowList};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match run(args).await {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

async fn run(args: Cli) -> anyhow::Result<FormattedString> {
    let mut client = connect(&args)?;
    execute_and_close(&mut client, args.command).await
}

/// Runs `command`, closing the client whether or not it succeeded.
async fn execute_and_close(
    client: &mut FeastClient,
    command: Commands,
) -> anyhow::Result<FormattedString> {
    let output = execute(client, command).await;
    client.close().await;
    output
}

async fn execute(client: &FeastClient, command: Commands) -> anyhow::Result<FormattedString> {
    let output = match command {
        Commands::Info => client
            .get_feast_serving_info()
            .await
            .context("Failed to get serving info")?
            .into(),
        Commands::Get {
            features,
            entities,
            project,
        } => {
            let rows = [entity_row(entities)];
            let rows = client
                .get_online_features_in_project(&features, &rows, &project)
                .await
                .context("Failed to get online features")?;
            RowList(rows).into()
        }
    };

    Ok(output)
}

fn connect(args: &Cli) -> anyhow::Result<FeastClient> {
    let mut builder = SecurityConfig::builder().tls_enabled(args.tls || args.certificate.is_some());
    if let Some(path) = &args.certificate {
        builder = builder.certificate_path(path);
    }
    if let Some(token) = &args.token {
        builder = builder.credentials(BearerToken::new(token));
    }

    FeastClient::create_secure(&args.host, args.port, builder.build()).with_context(|| {
        format!(
            "Failed to configure the connection to {}:{}",
            args.host, args.port
        )
    })
}

fn entity_row(entities: Vec<(String, EntityValue)>) -> Row {
    entities
        .into_iter()
        .fold(Row::create(), |row, (name, value)| row.set(name, value))
}
