//! Core domain for the supplier invoice sync.
//!
//! Holds the invoice models, run configuration, the provider/writer contracts
//! and the fetch → filter → enrich → load pipeline. HTTP and storage live in
//! their own crates and plug in through [`invoices::InvoiceProvider`] and
//! [`invoices::InvoiceTableWriter`].

pub mod config;
pub mod errors;
pub mod invoices;
pub mod sync;

pub use config::{Credential, Credentials, RetryPolicy, SyncConfig, TableDestination};
pub use errors::{Error, Result};
