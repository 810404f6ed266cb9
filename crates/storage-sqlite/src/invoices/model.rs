//! Row layout of the supplier invoice table.

use invoice_sync_core::invoices::{EnrichedInvoiceRow, InvoiceRow, INVOICE_TABLE_COLUMNS};
use rust_decimal::Decimal;
use rusqlite::types::Type;
use std::str::FromStr;

use crate::db::quote_identifier;

/// SQL type of each entry in [`INVOICE_TABLE_COLUMNS`].
const COLUMN_TYPES: [&str; 12] = [
    "TEXT NOT NULL",
    "TEXT",
    "TEXT",
    "TEXT",
    "TEXT",
    "TEXT",
    "TEXT",
    "INTEGER",
    "TEXT",
    "INTEGER",
    "TEXT",
    "TEXT",
];

/// Flat database form of an enriched invoice. Amounts are stored as text to keep
/// their exact decimal value.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecordDB {
    pub tag: String,
    pub amount: Option<String>,
    pub invoice_date: Option<String>,
    pub echeance: Option<String>,
    pub label: Option<String>,
    pub payment_status: Option<String>,
    pub updated_at: Option<String>,
    pub reconciled: Option<bool>,
    pub accounting_status: Option<String>,
    pub fournisseur_id: Option<i64>,
    pub matching_transaction: Option<String>,
    pub transaction_date: Option<String>,
}

impl InvoiceRecordDB {
    pub fn create_table_sql(table: &str) -> String {
        let columns = INVOICE_TABLE_COLUMNS
            .iter()
            .zip(COLUMN_TYPES.iter())
            .map(|(name, sql_type)| format!("{} {}", name, sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", quote_identifier(table), columns)
    }

    pub fn insert_sql(table: &str) -> String {
        let placeholders = (1..=INVOICE_TABLE_COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            INVOICE_TABLE_COLUMNS.join(", "),
            placeholders
        )
    }

    pub fn select_sql(table: &str) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY rowid",
            INVOICE_TABLE_COLUMNS.join(", "),
            quote_identifier(table)
        )
    }

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            tag: row.get(0)?,
            amount: row.get(1)?,
            invoice_date: row.get(2)?,
            echeance: row.get(3)?,
            label: row.get(4)?,
            payment_status: row.get(5)?,
            updated_at: row.get(6)?,
            reconciled: row.get(7)?,
            accounting_status: row.get(8)?,
            fournisseur_id: row.get(9)?,
            matching_transaction: row.get(10)?,
            transaction_date: row.get(11)?,
        })
    }

    pub fn execute_insert(&self, stmt: &mut rusqlite::CachedStatement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(rusqlite::params![
            self.tag,
            self.amount,
            self.invoice_date,
            self.echeance,
            self.label,
            self.payment_status,
            self.updated_at,
            self.reconciled,
            self.accounting_status,
            self.fournisseur_id,
            self.matching_transaction,
            self.transaction_date,
        ])
    }

    pub fn into_domain(self) -> rusqlite::Result<EnrichedInvoiceRow> {
        let amount = self
            .amount
            .as_deref()
            .map(Decimal::from_str)
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        Ok(EnrichedInvoiceRow {
            invoice: InvoiceRow {
                tag: self.tag,
                amount,
                invoice_date: self.invoice_date,
                due_date: self.echeance,
                label: self.label,
                payment_status: self.payment_status,
                updated_at: self.updated_at,
                reconciled: self.reconciled,
                accounting_status: self.accounting_status,
                supplier_id: self.fournisseur_id,
                matching_transaction: self.matching_transaction,
            },
            transaction_date: self.transaction_date,
        })
    }
}

impl From<&EnrichedInvoiceRow> for InvoiceRecordDB {
    fn from(row: &EnrichedInvoiceRow) -> Self {
        let invoice = &row.invoice;
        Self {
            tag: invoice.tag.clone(),
            amount: invoice.amount.map(|a| a.to_string()),
            invoice_date: invoice.invoice_date.clone(),
            echeance: invoice.due_date.clone(),
            label: invoice.label.clone(),
            payment_status: invoice.payment_status.clone(),
            updated_at: invoice.updated_at.clone(),
            reconciled: invoice.reconciled,
            accounting_status: invoice.accounting_status.clone(),
            fournisseur_id: invoice.supplier_id,
            matching_transaction: invoice.matching_transaction.clone(),
            transaction_date: row.transaction_date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_lists_every_column_in_order() {
        let sql = InvoiceRecordDB::create_table_sql("Pennylane.suppliers_invoices");
        assert!(sql.starts_with("CREATE TABLE \"Pennylane.suppliers_invoices\" (tag TEXT NOT NULL, amount TEXT"));
        assert!(sql.ends_with("matching_transaction TEXT, transaction_date TEXT)"));
    }

    #[test]
    fn insert_has_one_placeholder_per_column() {
        let sql = InvoiceRecordDB::insert_sql("t");
        assert!(sql.contains("?12)"));
        assert!(!sql.contains("?13"));
    }
}
