use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use estate_search::analytics::EventDispatcher;
use estate_search::api::create_router;
use estate_search::composer;
use estate_search::config::CONFIG;
use estate_search::db::{Database, MongoCatalog, SearchEventRepo};
use estate_search::parser::QueryParser;
use estate_search::query_engine::SearchEngine;

#[derive(Parser)]
#[command(name = "estate-search")]
#[command(about = "Natural language property search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the search API
    Serve {
        /// Address to listen on, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print what the parser understands of a query
    Parse {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(CONFIG.log_level)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => serve(bind.unwrap_or_else(|| CONFIG.bind_addr.clone())).await,
        Command::Parse { query } => print_parse(&query.join(" ")),
    }
}

async fn serve(bind_addr: String) -> Result<()> {
    let db = Database::from_config().await?;
    let catalog = Arc::new(MongoCatalog::new(&db));
    let events = EventDispatcher::spawn(Arc::new(SearchEventRepo::new(&db)));

    let engine =
        SearchEngine::new(catalog, CONFIG.search.clone()).with_event_sink(Arc::new(events));
    let app = create_router(Arc::new(engine));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
}

fn print_parse(text: &str) -> Result<()> {
    let parser = QueryParser::new(CONFIG.search.weights);
    let parsed = parser.parse(text);
    let report = json!({
        "summary": composer::summarize(&parsed),
        "searchParams": composer::search_params(&parsed),
        "fallback": parsed.confidence < CONFIG.search.fallback_threshold,
        "parsed": parsed,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
