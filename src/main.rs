use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshet::app::AppContext;
use freshet::cli::{commands, Cli, Commands};
use freshet::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config);

    match cli.command {
        Commands::Run {
            pages,
            refresh,
            json,
        } => {
            commands::run(&ctx, pages, refresh, json).await?;
        }
        Commands::Track {
            pages,
            viewport,
            item_height,
        } => {
            commands::track(&ctx, pages, viewport, item_height).await?;
        }
    }

    ctx.shutdown().await;
    Ok(())
}
