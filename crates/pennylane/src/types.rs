//! Response shapes of the Pennylane external API (v2).

use invoice_sync_core::invoices::InvoiceRow;
use log::debug;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// One page of `GET /supplier_invoices`.
///
/// Items stay as raw JSON so that one malformed invoice does not sink the page.
#[derive(Debug, Deserialize)]
pub struct SupplierInvoicePage {
    pub items: Option<Vec<Value>>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedTransactionsRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

/// A supplier invoice as listed by the API. Only consumed fields are declared.
///
/// Every field decodes on its own: a value of the wrong type becomes `None`
/// (scalars are stringified for text fields) and the rest of the row is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierInvoice {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub reconciled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub accounting_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub supplier: Option<SupplierRef>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub matched_transactions: Option<MatchedTransactionsRef>,
}

impl SupplierInvoice {
    pub fn into_row(self, tag: &str) -> InvoiceRow {
        InvoiceRow {
            tag: tag.to_string(),
            amount: self.amount,
            invoice_date: self.date,
            due_date: self.deadline,
            label: self.label,
            payment_status: self.payment_status,
            updated_at: self.updated_at,
            reconciled: self.reconciled,
            accounting_status: self.accounting_status,
            supplier_id: self.supplier.and_then(|s| s.id),
            matching_transaction: self.matched_transactions.and_then(|m| m.url),
        }
    }
}

/// Body behind a `matched_transactions.url`.
#[derive(Debug, Deserialize)]
pub struct MatchedTransactionList {
    #[serde(default)]
    pub items: Option<Vec<MatchedTransaction>>,
}

#[derive(Debug, Deserialize)]
pub struct MatchedTransaction {
    #[serde(default)]
    pub date: Option<String>,
}

impl MatchedTransactionList {
    /// Date of the first transaction, if any.
    pub fn first_date(self) -> Option<String> {
        self.items?.into_iter().next()?.date
    }
}

fn raw_value<'de, D>(deserializer: D) -> std::result::Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            debug!("Ignoring non-scalar text field: {}", other);
            None
        }
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::Null => None,
        other => {
            debug!("Ignoring non-boolean flag: {}", other);
            None
        }
    })
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw_value(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match raw_value(deserializer)? {
        Value::Null => Ok(None),
        value => Ok(serde_json::from_value(value)
            .map_err(|e| debug!("Ignoring malformed nested object: {}", e))
            .ok()),
    }
}

/// Amounts arrive as decimal strings; plain JSON numbers are accepted too.
/// Anything else, including unparsable text, is `None`.
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match raw_value(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => return Ok(None),
        other => {
            debug!("Ignoring amount of unexpected type: {}", other);
            return Ok(None);
        }
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| debug!("Ignoring unparsable amount '{}': {}", raw, e))
        .ok())
}
