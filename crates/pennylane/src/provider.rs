use async_trait::async_trait;

use invoice_sync_core::config::Credential;
use invoice_sync_core::invoices::{CredentialFetch, InvoiceProvider};

use crate::client::PennylaneClient;

#[async_trait]
impl InvoiceProvider for PennylaneClient {
    async fn fetch_invoices(
        &self,
        credential: &Credential,
    ) -> invoice_sync_core::Result<CredentialFetch> {
        Ok(self.fetch_supplier_invoices(credential).await?)
    }

    async fn fetch_transaction_date(&self, credential: &Credential, url: &str) -> Option<String> {
        PennylaneClient::fetch_transaction_date(self, credential, url).await
    }
}
