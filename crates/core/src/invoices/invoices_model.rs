//! Invoice rows as they flow from the listing endpoint to the destination table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Accounting status that excludes an invoice from the dataset.
pub const ARCHIVED_STATUS: &str = "archived";

/// Column order of the destination table.
pub const INVOICE_TABLE_COLUMNS: [&str; 12] = [
    "tag",
    "amount",
    "invoice_date",
    "echeance",
    "label",
    "payment_status",
    "updated_at",
    "reconciled",
    "accounting_status",
    "fournisseur_id",
    "matching_transaction",
    "transaction_date",
];

/// One `{field, operator, value}` filter sent to the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl ListingFilter {
    pub fn date_on_or_after(date: NaiveDate) -> Self {
        Self {
            field: "date".to_string(),
            operator: "gteq".to_string(),
            value: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A supplier invoice normalized from one listing item.
///
/// Only `tag` is guaranteed; every other field mirrors the API's optionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub tag: String,
    pub amount: Option<Decimal>,
    pub invoice_date: Option<String>,
    #[serde(rename = "echeance")]
    pub due_date: Option<String>,
    pub label: Option<String>,
    pub payment_status: Option<String>,
    pub updated_at: Option<String>,
    pub reconciled: Option<bool>,
    pub accounting_status: Option<String>,
    #[serde(rename = "fournisseur_id")]
    pub supplier_id: Option<i64>,
    pub matching_transaction: Option<String>,
}

impl InvoiceRow {
    /// Empty row for `tag`, fields filled in by the caller.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            amount: None,
            invoice_date: None,
            due_date: None,
            label: None,
            payment_status: None,
            updated_at: None,
            reconciled: None,
            accounting_status: None,
            supplier_id: None,
            matching_transaction: None,
        }
    }

    /// Reconciled and not archived. A missing status does not exclude the row.
    pub fn is_reconciled_and_active(&self) -> bool {
        self.reconciled == Some(true)
            && self.accounting_status.as_deref() != Some(ARCHIVED_STATUS)
    }

    /// Matched-transaction URL, if present and not blank.
    pub fn transaction_url(&self) -> Option<&str> {
        self.matching_transaction
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn with_transaction_date(self, transaction_date: Option<String>) -> EnrichedInvoiceRow {
        EnrichedInvoiceRow {
            invoice: self,
            transaction_date,
        }
    }
}

/// An invoice row after the transaction-date lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedInvoiceRow {
    #[serde(flatten)]
    pub invoice: InvoiceRow,
    pub transaction_date: Option<String>,
}

impl EnrichedInvoiceRow {
    /// Only a missing date counts; an empty string from the API is kept as is.
    pub fn is_dated(&self) -> bool {
        self.transaction_date.is_some()
    }
}

/// Rows collected for one credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialFetch {
    pub tag: String,
    /// Rows in page order.
    pub rows: Vec<InvoiceRow>,
    pub pages: usize,
    /// Why pagination stopped before `has_more = false`, if it did.
    pub aborted: Option<String>,
}

impl CredentialFetch {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn abort(mut self, reason: impl Into<String>) -> Self {
        self.aborted = Some(reason.into());
        self
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(reconciled: Option<bool>, status: Option<&str>) -> InvoiceRow {
        InvoiceRow {
            reconciled,
            accounting_status: status.map(str::to_string),
            ..InvoiceRow::new("paris")
        }
    }

    #[test]
    fn only_reconciled_non_archived_rows_pass() {
        assert!(row(Some(true), Some("draft")).is_reconciled_and_active());
        assert!(row(Some(true), None).is_reconciled_and_active());
        assert!(!row(Some(true), Some("archived")).is_reconciled_and_active());
        assert!(!row(Some(false), Some("draft")).is_reconciled_and_active());
        assert!(!row(None, Some("draft")).is_reconciled_and_active());
    }

    #[test]
    fn blank_transaction_url_is_treated_as_missing() {
        let mut invoice = InvoiceRow::new("paris");
        assert_eq!(invoice.transaction_url(), None);

        invoice.matching_transaction = Some("   ".to_string());
        assert_eq!(invoice.transaction_url(), None);

        invoice.matching_transaction = Some(" https://api.test/tx/1 ".to_string());
        assert_eq!(invoice.transaction_url(), Some("https://api.test/tx/1"));
    }

    #[test]
    fn listing_filter_serializes_as_api_expects() {
        let filter = ListingFilter::date_on_or_after(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let json = serde_json::to_string(&vec![filter]).unwrap();
        assert_eq!(
            json,
            r#"[{"field":"date","operator":"gteq","value":"2025-01-01"}]"#
        );
    }

    #[test]
    fn enriched_row_serializes_with_table_column_names() {
        let mut invoice = InvoiceRow::new("paris");
        invoice.amount = Some(dec!(120.50));
        invoice.due_date = Some("2025-02-01".to_string());
        invoice.supplier_id = Some(42);
        let enriched = invoice.with_transaction_date(Some("2025-01-20".to_string()));

        let value = serde_json::to_value(&enriched).unwrap();
        let object = value.as_object().unwrap();
        for column in INVOICE_TABLE_COLUMNS {
            assert!(object.contains_key(column), "missing column {}", column);
        }
        assert_eq!(value["echeance"], "2025-02-01");
        assert_eq!(value["fournisseur_id"], 42);
        assert!(enriched.is_dated());
    }

    #[test]
    fn only_missing_transaction_date_is_undated() {
        let enriched = InvoiceRow::new("paris").with_transaction_date(None);
        assert!(!enriched.is_dated());
        let enriched = InvoiceRow::new("paris").with_transaction_date(Some(String::new()));
        assert!(enriched.is_dated());
        let enriched = InvoiceRow::new("paris").with_transaction_date(Some(" ".to_string()));
        assert!(enriched.is_dated());
    }
}
