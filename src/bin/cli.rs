//! Influx Provider CLI
//!
//! Command-line interface for provider operations:
//! - Run or dry-run query descriptors
//! - Insert documents
//! - Collection housekeeping
//! - Generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use influx_provider::{
    generate_default_config, init_tracing, Config, DefaultHelpers, InfluxProvider, InsertOptions,
    LoggingConfig, QueryContext, QueryDescriptor,
};
use influx_provider::query::CollectionRef;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "influx-provider-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Analytical queries over InfluxDB")]
#[command(long_about = "Compile dimension/metric query descriptors into InfluxQL, run them\nconcurrently and print the merged rows.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a query descriptor
    Query {
        /// JSON descriptor file ("-" for stdin)
        file: PathBuf,
    },

    /// Compile a descriptor and print its statements without running them
    Plan {
        /// JSON descriptor file ("-" for stdin)
        file: PathBuf,
    },

    /// Insert documents into a collection
    Insert {
        /// Collection key
        collection: String,
        /// JSON file with a document or an array of documents ("-" for stdin)
        file: PathBuf,
        /// Physical measurement name (default: collection key)
        #[arg(long)]
        store_key: Option<String>,
        /// Field holding each document's time
        #[arg(long)]
        time_field: Option<String>,
    },

    /// Show point counts of a collection
    Stats {
        /// Collection key
        collection: String,
    },

    /// Drop every series of a collection
    Drop {
        /// Collection key
        collection: String,
    },

    /// Drop the whole database
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&LoggingConfig {
        level: "warn".to_string(),
        ..config.logging.clone()
    });

    let helpers = DefaultHelpers::shared();
    let provider = InfluxProvider::open(&config, helpers.clone())?;
    let ctx = QueryContext::generate(helpers.as_ref());

    match cli.command {
        Commands::Query { file } => {
            let descriptor: QueryDescriptor = serde_json::from_value(read_json(&file)?)
                .context("Invalid query descriptor")?;
            let response = provider.query(&ctx, &descriptor).await?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                Format::Table => {
                    let mut columns: Vec<String> =
                        response.dimensions.iter().map(|d| d.key.replace('.', "_")).collect();
                    columns.extend(
                        response
                            .metrics
                            .iter()
                            .filter(|m| !m.is_placeholder())
                            .map(|m| m.key.replace('.', "_")),
                    );
                    print_table(&columns, &response.documents);
                    for anomaly in &response.anomalies {
                        eprintln!("warning: {}", anomaly);
                    }
                }
            }
        }

        Commands::Plan { file } => {
            let descriptor: QueryDescriptor = serde_json::from_value(read_json(&file)?)
                .context("Invalid query descriptor")?;
            let plan = provider.plan(&descriptor)?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                Format::Table => {
                    println!("Plan {} ({} sub-queries)", plan.queryplan.uid, plan.statements.len());
                    println!();
                    for (key, statement) in &plan.statements {
                        println!("{:.12}  {}", key, statement);
                    }
                }
            }
        }

        Commands::Insert {
            collection,
            file,
            store_key,
            time_field,
        } => {
            let documents = match read_json(&file)? {
                Value::Array(items) => items,
                document @ Value::Object(_) => vec![document],
                _ => bail!("Expected a JSON object or array of objects"),
            };
            let collection = match store_key {
                Some(store_key) => CollectionRef::new(collection).with_store_key(store_key),
                None => CollectionRef::new(collection),
            };

            let inserted = provider
                .insert(&ctx, &collection, &documents, &InsertOptions { time_field })
                .await?;
            println!("Inserted {} documents into {}", inserted, collection.key);
        }

        Commands::Stats { collection } => {
            let stats = provider.stats(&CollectionRef::new(collection)).await?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Table => {
                    if stats.counts.is_empty() {
                        println!("No points in {}", stats.collection);
                    } else {
                        println!("{:<30} {}", "Field", "Points");
                        println!("{}", "-".repeat(42));
                        for (field, count) in &stats.counts {
                            println!("{:<30} {}", field.trim_start_matches("count_"), count);
                        }
                    }
                }
            }
        }

        Commands::Drop { collection } => {
            provider
                .drop_collection(&CollectionRef::new(collection.clone()))
                .await?;
            println!("Dropped {}", collection);
        }

        Commands::Purge { yes } => {
            if !yes {
                bail!(
                    "Refusing to drop database {} without --yes",
                    config.influx.database
                );
            }
            provider.purge().await?;
            println!("Dropped database {}", config.influx.database);
        }

        // Written before connecting
        Commands::Config { .. } => {}
    }

    provider.close().await;
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
    };

    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn print_table(columns: &[String], rows: &[Map<String, Value>]) {
    if rows.is_empty() {
        println!("No data");
        return;
    }

    let cell = |row: &Map<String, Value>, column: &str| match row.get(column) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .map(|row| cell(row, column).len())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column, width = width))
        .collect();
    println!("{}", header.join("  "));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", cell(row, column), width = width))
            .collect();
        println!("{}", line.join("  "));
    }
    println!();
    println!("{} rows", rows.len());
}
