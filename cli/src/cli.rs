use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about = "Self-healing bitemporal knowledge graph")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print health and node/edge/stale counts.
    Status,
    /// Scrape, extract, and upsert a single URL.
    Watch { url: String },
    /// Run one healing pass over stale documents.
    Heal {
        #[arg(long)]
        days: Option<i64>,
    },
    /// Print the crate version.
    Version,
}
