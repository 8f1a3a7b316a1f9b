use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coverage_core::FhirDate;
use time::Date;

#[derive(Parser)]
#[command(name = "coverage-contract")]
#[command(about = "Coverage eligibility ledger: store FHIR resources and evaluate eligibility")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: coverage.toml)
    #[arg(short, long, global = true, env = "COVERAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// World-state snapshot to load before and save after the command
    #[arg(short, long, global = true, env = "COVERAGE_STATE")]
    pub state: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the ledger (no-op)
    InitLedger,
    /// Read a resource by type and id
    Query(QueryArgs),
    /// Add a resource; eligibility requests are evaluated and published
    Add(AddArgs),
    /// Replace a resource, creating it if absent
    Replace(WriteArgs),
    /// Merge a partial resource into an existing one
    Update(WriteArgs),
}

#[derive(clap::Args)]
pub struct QueryArgs {
    /// Resource type (e.g. Coverage)
    #[arg(short = 't', long = "type")]
    pub resource_type: String,
    /// Resource id
    #[arg(short, long)]
    pub id: String,
}

#[derive(clap::Args)]
pub struct WriteArgs {
    /// JSON file containing the resource ("-" for stdin)
    #[arg(short, long)]
    pub file: PathBuf,
    /// Expected resource id (defaults to the id in the file)
    #[arg(short, long, default_value = "")]
    pub id: String,
}

#[derive(clap::Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub write: WriteArgs,
    /// Evaluation date for eligibility responses (YYYY-MM-DD, default: today UTC)
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<Date>,
}

fn parse_as_of(s: &str) -> Result<Date, String> {
    FhirDate::parse_date(s)
        .map(|d| d.date())
        .map_err(|e| e.to_string())
}
