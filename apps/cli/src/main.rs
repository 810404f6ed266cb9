mod cli;
mod logging;

use clap::Parser;
use std::sync::Arc;

use cli::Cli;
use invoice_sync_core::sync::{InvoiceSyncService, SyncReport};
use invoice_sync_pennylane::PennylaneClient;
use invoice_sync_storage_sqlite::InvoiceTableRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let credentials = cli.load_credentials()?;
    let config = cli.sync_config();
    config.validate()?;
    let destination = cli.destination();
    destination.validate()?;
    let writer = InvoiceTableRepository::new(&cli.data_dir, &destination, cli.batch_size)?;

    if cli.check {
        tracing::info!(
            "Configuration OK: {} credentials, destination {} in {}",
            credentials.len(),
            destination,
            writer.db_path().display()
        );
        return Ok(());
    }

    let client = PennylaneClient::new(&config)?;
    let service = InvoiceSyncService::new(Arc::new(client), Arc::new(writer), credentials, config);
    let report = service.run(cli.dry_run).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "credentials: {} ({} complete, {} partial, {} failed)",
        report.credentials,
        report.credentials_completed.len(),
        report.credentials_aborted.len(),
        report.credentials_failed.len()
    );
    println!("fetched:     {}", report.rows_fetched);
    println!("reconciled:  {}", report.rows_after_filter);
    println!(
        "dated:       {} ({} dropped)",
        report.rows_enriched, report.rows_dropped
    );
    if report.dry_run {
        println!("loaded:      skipped (dry run)");
    } else {
        println!("loaded:      {}", report.rows_loaded);
    }
    println!("duration:    {} ms", report.duration_ms);
}
