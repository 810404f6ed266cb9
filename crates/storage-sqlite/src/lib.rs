//! SQLite destination for the supplier invoice dataset.

pub mod db;
pub mod errors;
pub mod invoices;

pub use errors::{Result, StorageError};
pub use invoices::InvoiceTableRepository;
