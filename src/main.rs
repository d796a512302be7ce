//! HBNB console
//!
//! Administrative commands against the storage backend selected by the
//! `HBNB_*` environment variables.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hbnb::{storage, Config, Kind, Record};
use serde_json::{Map, Number, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hbnb")]
#[command(author, version, about = "HBNB console - inspect and edit stored records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the storage file or schema if missing
    Init,

    /// Count records of every kind
    Stats,

    /// Create a record: `create Place name="My_house" number_rooms=4`
    Create {
        kind: Kind,

        /// key=value pairs; quoted strings (underscores become spaces), integers or floats
        params: Vec<String>,
    },

    /// Print every record, optionally of one kind
    All { kind: Option<Kind> },

    /// Print one record
    Show { kind: Kind, id: String },

    /// Delete one record
    Destroy { kind: Kind, id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("invalid HBNB_* configuration")?;
    let mut store = storage::open(&config).context("failed to open storage")?;

    match cli.command {
        Commands::Init => {
            store.save()?;
            info!(backend = ?config.storage_type, "storage initialized");
            println!("Storage ready ({:?})", config.storage_type);
        }
        Commands::Stats => {
            for kind in Kind::ALL {
                println!("{:<10} {}", kind.plural(), store.count(Some(kind))?);
            }
        }
        Commands::Create { kind, params } => {
            let mut record = Record::from_payload(kind, parse_params(&params))
                .with_context(|| format!("invalid {} attributes", kind))?;
            if let Record::User(user) = &mut record {
                let plain = user.password.clone();
                user.set_password(&plain);
            }
            let id = record.id().to_string();
            store.new(record)?;
            store.save()?;
            println!("{}", id);
        }
        Commands::All { kind } => {
            for record in store.all(kind)?.values() {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        Commands::Show { kind, id } => match store.get(kind, &id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => bail!("no instance found: {}.{}", kind, id),
        },
        Commands::Destroy { kind, id } => {
            let Some(record) = store.get(kind, &id)? else {
                bail!("no instance found: {}.{}", kind, id);
            };
            store.delete(&record)?;
            store.save()?;
            info!(key = %record.key(), "destroyed");
        }
    }

    store.close()?;
    Ok(())
}

/// Parse `key=value` arguments, skipping any that do not parse
fn parse_params(params: &[String]) -> Map<String, Value> {
    params
        .iter()
        .filter_map(|param| {
            let (key, raw) = param.split_once('=')?;
            parse_value(raw).map(|value| (key.to_string(), value))
        })
        .collect()
}

fn parse_value(raw: &str) -> Option<Value> {
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        let text = inner.replace("\\\"", "\"").replace('_', " ");
        return Some(Value::String(text));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
