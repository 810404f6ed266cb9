//! Supplier invoice table storage.

mod model;
mod repository;

pub use model::InvoiceRecordDB;
pub use repository::{InvoiceTableRepository, DEFAULT_BATCH_SIZE};
