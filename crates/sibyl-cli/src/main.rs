//! Sibyl CLI - manage and query the intent registry from the command line

use anyhow::Result;
use clap::Parser as _;
use cli::Cli;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

mod cli;
mod handlers;

fn main() -> Result<()> {
    Registry::default()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sibyl_engine=info,sibyl_cli=info".into()),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();
    handlers::dispatch(cli)
}
