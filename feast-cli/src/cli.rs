//! # CLI
//!
//! This module defines the command-line interface of `feast-cli` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring entities are `name=value`).
use clap::{Parser, Subcommand};
use feast_client::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "feast-cli", version, about = "Query a Feast online serving deployment")]
pub struct Cli {
    /// Serving host (e.g. localhost)
    pub host: String,

    /// Serving port (e.g. 6566)
    pub port: u16,

    /// Connect over TLS
    #[arg(long, global = true)]
    pub tls: bool,

    /// PEM certificate to trust instead of the system roots. Implies --tls
    #[arg(long, global = true)]
    pub certificate: Option<PathBuf>,

    /// Bearer token sent with every call
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the version and type of the serving deployment
    Info,

    /// Retrieve online features for one entity
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// feast-cli localhost 6566 get --feature driver:trips_today --entity driver_id=1001
    /// ```
    Get {
        /// Feature reference (table:feature)
        #[arg(short, long = "feature", required = true)]
        features: Vec<String>,

        /// Entity key (name=value). Integer values are sent as int64
        #[arg(short, long = "entity", value_parser = parse_entity, required = true)]
        entities: Vec<(String, EntityValue)>,

        /// Project to retrieve from (the server default when omitted)
        #[arg(short, long, default_value = "")]
        project: String,
    },
}

/// An entity key value given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    Int64(i64),
    String(String),
}

impl From<EntityValue> for Value {
    fn from(value: EntityValue) -> Self {
        match value {
            EntityValue::Int64(v) => Value::from(v),
            EntityValue::String(v) => Value::from(v),
        }
    }
}

fn parse_entity(s: &str) -> Result<(String, EntityValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid entity format: '{s}'. Expected 'name=value'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("Entity name cannot be empty".to_string());
    }

    let value = value.trim();
    let value = match value.parse::<i64>() {
        Ok(v) => EntityValue::Int64(v),
        Err(_) => EntityValue::String(value.to_string()),
    };

    Ok((name.to_string(), value))
}
