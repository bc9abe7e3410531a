pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "A feed synchronization engine over a simulated source", long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to ~/.config/freshet/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load pages from the source and print the synchronized feed
    Run {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 3)]
        pages: u32,

        /// Refresh after loading (prepends a fresh batch)
        #[arg(long)]
        refresh: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sweep a simulated viewport across the feed and print exposure logs
    Track {
        /// Number of pages to load before tracking
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Viewport height
        #[arg(long, default_value_t = 800)]
        viewport: i32,

        /// Height of each feed card
        #[arg(long, default_value_t = 300)]
        item_height: i32,
    },
}
