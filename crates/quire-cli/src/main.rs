//! Quire CLI - todo lists and notes from the terminal.

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::attachment::run_attachment;
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::item::run_item;
use crate::commands::note::run_note;
use crate::commands::todo::run_todo;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "quire=info";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
        Commands::Config { command } => run_config(command, config_path, cli.json),
        Commands::Todo { command } => {
            let mut ctx = Context::connect(config_path, cli.json)?;
            let result = run_todo(&ctx, command).await;
            ctx.finish(result)
        }
        Commands::Item { command } => {
            let mut ctx = Context::connect(config_path, cli.json)?;
            let result = run_item(&ctx, command).await;
            ctx.finish(result)
        }
        Commands::Note { command } => {
            let mut ctx = Context::connect(config_path, cli.json)?;
            let result = run_note(&ctx, command).await;
            ctx.finish(result)
        }
        Commands::Attachment { command } => {
            let mut ctx = Context::connect(config_path, cli.json)?;
            let result = run_attachment(&ctx, command).await;
            ctx.finish(result)
        }
    }
}
