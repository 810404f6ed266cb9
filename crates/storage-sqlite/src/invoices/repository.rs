use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};

use invoice_sync_core::config::TableDestination;
use invoice_sync_core::invoices::{EnrichedInvoiceRow, InvoiceTableWriter};

use super::model::InvoiceRecordDB;
use crate::db::{database_path, open_connection, quote_identifier};
use crate::errors::{Result, StorageError};

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

const STAGING_SUFFIX: &str = "__staging";

/// Full-replace writer for the supplier invoice table.
///
/// Rows go into a staging table one batch per transaction; a last transaction
/// drops the live table and renames the staging table over it.
#[derive(Debug, Clone)]
pub struct InvoiceTableRepository {
    db_path: PathBuf,
    table: String,
    batch_size: usize,
}

impl InvoiceTableRepository {
    pub fn new(data_dir: &Path, destination: &TableDestination, batch_size: usize) -> Result<Self> {
        let db_path = database_path(data_dir, &destination.project)?;
        Self::with_db_path(db_path, &destination.table, batch_size)
    }

    pub fn with_db_path(db_path: PathBuf, table: &str, batch_size: usize) -> Result<Self> {
        let table = table.trim();
        if table.is_empty() {
            return Err(StorageError::InvalidDestination(
                "table name must not be empty".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(StorageError::InvalidDestination(
                "batch size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            db_path,
            table: table.to_string(),
            batch_size,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn staging_table(&self) -> String {
        format!("{}{}", self.table, STAGING_SUFFIX)
    }

    pub fn replace_all_blocking(&self, rows: &[EnrichedInvoiceRow]) -> Result<usize> {
        let mut conn = open_connection(&self.db_path)?;
        let staging = self.staging_table();

        // A staging table left by a failed run is discarded here.
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {};\n{};",
            quote_identifier(&staging),
            InvoiceRecordDB::create_table_sql(&staging)
        ))?;

        let insert_sql = InvoiceRecordDB::insert_sql(&staging);
        let mut written = 0usize;
        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&insert_sql)?;
                for row in batch {
                    InvoiceRecordDB::from(row).execute_insert(&mut stmt)?;
                }
            }
            tx.commit()?;
            written += batch.len();
            debug!(
                "Wrote batch {} ({} rows, {}/{}) into {}",
                index + 1,
                batch.len(),
                written,
                rows.len(),
                staging
            );
        }

        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {};\nALTER TABLE {} RENAME TO {};",
            quote_identifier(&self.table),
            quote_identifier(&staging),
            quote_identifier(&self.table)
        ))?;
        tx.commit()?;

        info!(
            "Replaced {} in {} with {} rows",
            self.table,
            self.db_path.display(),
            written
        );
        Ok(written)
    }

    /// Current content of the live table, in insertion order.
    pub fn load_all(&self) -> Result<Vec<EnrichedInvoiceRow>> {
        let conn = open_connection(&self.db_path)?;
        let mut stmt = conn.prepare(&InvoiceRecordDB::select_sql(&self.table))?;
        let rows = stmt
            .query_map([], InvoiceRecordDB::from_row)?
            .map(|record| record.and_then(InvoiceRecordDB::into_domain))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_rows(&self) -> Result<usize> {
        let conn = open_connection(&self.db_path)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl InvoiceTableWriter for InvoiceTableRepository {
    async fn replace_all(
        &self,
        rows: Vec<EnrichedInvoiceRow>,
    ) -> invoice_sync_core::Result<usize> {
        let repository = self.clone();
        let written = tokio::task::spawn_blocking(move || repository.replace_all_blocking(&rows))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))??;
        Ok(written)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.table, self.db_path.display())
    }
}
