//! `stapi` - command line access to STAPI servers
//!
//! Reads products, orders and opportunities from a server as JSON on
//! stdout, and serves the in-memory demo backend. Logs go to stderr.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use stapi::clients::take_items;
use stapi::models::Geometry;
use stapi::server::{memory, serve};
use stapi::{Client, ClientError};

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn to_filter_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stapi", about = "Query and serve STAPI sensor tasking APIs", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root URL of the STAPI server
    #[arg(long, env = "STAPI_URL", global = true, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum, global = true, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List products
    Products {
        /// Page size requested from the server
        #[arg(long)]
        limit: Option<u32>,
        /// Stop after this many products
        #[arg(long)]
        max_items: Option<usize>,
    },
    /// Show one product
    Product {
        /// Product identifier
        #[arg(long)]
        id: String,
    },
    /// List orders
    Orders {
        /// Page size requested from the server
        #[arg(long)]
        limit: Option<u32>,
        /// Stop after this many orders
        #[arg(long)]
        max_items: Option<usize>,
    },
    /// Show one order
    Order {
        /// Order identifier
        #[arg(long)]
        id: String,
    },
    /// List the status history of an order
    OrderStatuses {
        /// Order identifier
        #[arg(long)]
        id: String,
        /// Page size requested from the server
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Search opportunities for a product
    Opportunities {
        /// Product identifier
        #[arg(long)]
        product_id: String,
        /// Page size requested from the server
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Stop after this many opportunities
        #[arg(long)]
        max_items: Option<usize>,
        /// Start of the search window (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// End of the search window (RFC 3339), defaults to a week after start
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        /// Longitude of the point of interest
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,
        /// Latitude of the point of interest
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,
    },
    /// Serve the in-memory demo backend
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
        /// Number of canned opportunities
        #[arg(long, default_value_t = 5)]
        opportunities: u32,
    },
}

fn initialize_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Serve { addr, opportunities } = cli.command {
        let backend = Arc::new(memory::InMemoryBackend::with_opportunities(
            memory::demo_opportunities(opportunities),
        ));
        let app = memory::demo_router(backend)?.into_router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        serve(listener, app).await?;
        return Ok(());
    }

    let client = Client::open(&cli.url)
        .await
        .with_context(|| format!("failed to open STAPI API at {}", cli.url))?;

    match cli.command {
        Command::Products { limit, max_items } => {
            let products = take_items(client.list_products(limit).await?, max_items).await?;
            print_json(&products)
        }
        Command::Product { id } => print_json(&client.get_product(&id).await?),
        Command::Orders { limit, max_items } => {
            let orders = take_items(client.list_orders(limit).await?, max_items).await?;
            print_json(&orders)
        }
        Command::Order { id } => print_json(&client.get_order(&id).await?),
        Command::OrderStatuses { id, limit } => {
            let statuses = take_items(client.list_order_statuses(&id, limit).await?, None).await?;
            print_json(&statuses)
        }
        Command::Opportunities {
            product_id,
            limit,
            max_items,
            start,
            end,
            lon,
            lat,
        } => {
            let start = start.unwrap_or_else(Utc::now);
            let end = end.unwrap_or(start + Duration::days(7));
            let stream = client
                .search_opportunities(&product_id, start, end, Geometry::point(lon, lat), None, limit)
                .await?;
            print_json(&take_items(stream, max_items).await?)
        }
        Command::Serve { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(ClientError::NotFound { resource, id }) = e.downcast_ref::<ClientError>() {
                eprintln!("{resource} with ID {id} not found");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
