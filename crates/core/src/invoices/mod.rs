//! Supplier invoice rows and the contracts the pipeline is wired through.

mod invoices_model;
mod invoices_traits;

pub use invoices_model::*;
pub use invoices_traits::*;
