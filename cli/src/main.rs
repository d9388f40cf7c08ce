mod commands;
mod config;
mod postgrest;
mod server;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_categories, cmd_food_show, cmd_foods, cmd_import, cmd_summary, load_catalog,
};
use crate::config::{Config, StoreKind};

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "A small nutrition tracker",
    long_about = "Browse a food catalog, total up a day's foods against a 2000 kcal budget, \
                  and import catalogs from JSON."
)]
struct Cli {
    /// Catalog store to use (overrides LARDER_STORE and config.json)
    #[arg(long, global = true, value_enum)]
    store: Option<StoreKind>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List food categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List foods, optionally filtered by category and search text
    Foods {
        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,
        /// Case-insensitive text to match in name or description
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one food with every nutrient
    Food {
        /// Food ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Total up a day's foods against the calorie budget
    Summary {
        /// Food IDs eaten today (repeat an ID to count it twice)
        foods: Vec<String>,
        /// Remove one occurrence of a food ID (repeatable)
        #[arg(long, value_name = "FOOD_ID")]
        remove: Vec<String>,
        /// Hour of day (0-23) used to pick the current meal (default: now)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import categories and foods from a JSON file
    Import {
        /// Path to the .json file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

/// Log to stderr. `RUST_LOG` overrides `default_filter`; `LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Commands::Serve { .. } => "larder=info,larder_core=info,tower_http=info",
        _ => "error",
    };
    init_tracing(default_filter);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = config.open_store(cli.store)?;

    match cli.command {
        Commands::Categories { json } => cmd_categories(&load_catalog(store.as_ref()).await, json),
        Commands::Foods {
            category,
            search,
            json,
        } => {
            let catalog = load_catalog(store.as_ref()).await;
            cmd_foods(&catalog, category.as_deref(), search.as_deref(), json)
        }
        Commands::Food { id, json } => {
            cmd_food_show(&load_catalog(store.as_ref()).await, &id, json)
        }
        Commands::Summary {
            foods,
            remove,
            hour,
            json,
        } => {
            let catalog = load_catalog(store.as_ref()).await;
            cmd_summary(catalog, &foods, &remove, hour, json)
        }
        Commands::Import { file, json } => cmd_import(store.as_ref(), &file, json).await,
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?)
            };
            server::start_server(store, port, &bind, api_key).await
        }
    }
}
