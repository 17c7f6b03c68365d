#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "weight_transfer=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    cli.run()
}
