mod cli;
mod output;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use coverage_contract::config::loader::load_config_with_default_path;
use coverage_contract::{CoverageContract, apply_logging_level, init_tracing};
use coverage_core::{CoreError, operation_outcome};
use coverage_core::time::today_utc;
use coverage_db_memory::InMemoryWorldState;

use cli::{Cli, Commands};
use output::{print_error, print_json, print_success};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    init_tracing();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        if let Some(core) = e.downcast_ref::<CoreError>() {
            tracing::debug!(category = %core.category(), "Command failed");
            if !core.issues().is_empty() {
                eprintln!("{:#}", operation_outcome(core.issues()));
            }
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load_config_with_default_path(cli.config.as_ref())
        .map_err(|e| anyhow!("Configuration error: {e}"))?;
    apply_logging_level(&cfg.logging.level);
    tracing::debug!(config = ?cfg, "Configuration loaded");

    let state = match &cli.state {
        Some(path) => InMemoryWorldState::load_snapshot(path).await?,
        None => InMemoryWorldState::new(),
    };
    let contract =
        CoverageContract::from_config(&cfg, Arc::new(state.clone())).map_err(anyhow::Error::msg)?;

    let mutated = match &cli.command {
        Commands::InitLedger => {
            contract.init_ledger().await?;
            print_success("Ledger initialized");
            false
        }
        Commands::Query(args) => {
            let text = contract
                .query_resource(&args.id, &args.resource_type)
                .await?;
            print_json(&text);
            false
        }
        Commands::Add(args) => {
            let raw = read_input(&args.write.file)?;
            let as_of = args.as_of.unwrap_or_else(today_utc);
            match contract.add_resource(&args.write.id, &raw, as_of).await? {
                Some(response) => print_json(&response),
                None => print_success("Resource added"),
            }
            true
        }
        Commands::Replace(args) => {
            let raw = read_input(&args.file)?;
            contract.replace_resource(&args.id, &raw).await?;
            print_success("Resource replaced");
            true
        }
        Commands::Update(args) => {
            let raw = read_input(&args.file)?;
            contract.update_resource(&args.id, &raw).await?;
            print_success("Resource updated");
            true
        }
    };

    if mutated && let Some(path) = &cli.state {
        state.save_snapshot(path).await?;
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read resource from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
