// src/main.rs

//! newswatch CLI.
//!
//! One binary, three process roles: the crawl worker, the server (admin
//! HTTP + notification consumer), and the one-shot schedule fan-out.

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use newswatch::bus::MessageBus;
use newswatch::config::Settings;
use newswatch::error::Result;
use newswatch::pipeline::{run_worker, schedule_sites};
use newswatch::server::run_server;
use newswatch::store::PgPageStore;

#[derive(Parser, Debug)]
#[command(name = "newswatch", version, about = "News/policy crawl pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the list-stage and detail-stage crawl consumers
    Worker,
    /// Run the admin HTTP surface and the notification consumer
    Serve,
    /// Publish one list-page job per site, then exit
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Worker => run_worker(&settings).await?,
        Command::Serve => run_server(&settings).await?,
        Command::Schedule => {
            let pool = PgPool::connect(&settings.database_url).await?;
            let store = PgPageStore::new(pool);
            let bus = MessageBus::connect(&settings).await?;
            let count = schedule_sites(&store, &bus).await?;
            bus.flush().await?;
            info!(count, "published list page jobs");
        }
    }

    Ok(())
}
