use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use invoice_sync_core::config::{
    Credentials, SyncConfig, TableDestination, DEFAULT_API_URL, DEFAULT_MAX_WORKERS,
    DEFAULT_PROJECT, DEFAULT_TABLE,
};
use invoice_sync_storage_sqlite::invoices::DEFAULT_BATCH_SIZE;

#[derive(Debug, Parser)]
#[command(
    name = "invoice-sync",
    version,
    about = "Sync Pennylane supplier invoices and their transaction dates into the warehouse"
)]
pub struct Cli {
    /// Pennylane external API base URL.
    #[arg(long, env = "PENNYLANE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// JSON object of tag -> API token.
    #[arg(long, env = "PENNYLANE_TOKENS", hide_env_values = true)]
    pub tokens: Option<String>,

    /// File holding the same JSON object as PENNYLANE_TOKENS. Takes precedence.
    #[arg(long)]
    pub tokens_file: Option<PathBuf>,

    /// Only list invoices dated on or after this day (YYYY-MM-DD).
    #[arg(long, env = "INVOICE_DATE_FROM", default_value = "2025-01-01")]
    pub since: NaiveDate,

    /// Credentials fetched in parallel.
    #[arg(long, env = "INVOICE_SYNC_MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,

    /// Transaction-date lookups in flight at once (1 = sequential).
    #[arg(long, default_value_t = 1)]
    pub enrichment_concurrency: usize,

    /// Warehouse project; selects the database file.
    #[arg(long, env = "WAREHOUSE_PROJECT", default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Destination table, replaced on every run.
    #[arg(long, env = "WAREHOUSE_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Directory holding the warehouse database files.
    #[arg(long, env = "WAREHOUSE_DATA_DIR", default_value = ".warehouse")]
    pub data_dir: PathBuf,

    /// Rows written per batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Fetch and enrich, but leave the destination table untouched.
    #[arg(long)]
    pub dry_run: bool,

    /// Validate configuration and credentials, then exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub check: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            invoice_date_from: self.since,
            max_workers: self.max_workers,
            enrichment_concurrency: self.enrichment_concurrency,
            ..SyncConfig::default()
        }
        .with_api_url(&self.api_url)
    }

    pub fn destination(&self) -> TableDestination {
        TableDestination::new(self.project.trim(), self.table.trim())
    }

    pub fn load_credentials(&self) -> anyhow::Result<Credentials> {
        let raw = match (&self.tokens_file, &self.tokens) {
            (Some(path), _) => std::fs::read_to_string(path)
                .with_context(|| format!("reading tokens file {}", path.display()))?,
            (None, Some(raw)) => raw.clone(),
            (None, None) => bail!("no credentials: set PENNYLANE_TOKENS or pass --tokens-file"),
        };
        Ok(Credentials::from_json(&raw)?)
    }
}
