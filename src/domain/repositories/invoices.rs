use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::invoices::{
    EditInvoiceEntity, InsertInvoiceEntity, InvoiceEntity, InvoiceListingRow,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository {
    async fn create_invoice(&self, invoice: InsertInvoiceEntity) -> Result<Uuid>;
    /// Returns the number of rows the update matched.
    async fn update_invoice(&self, invoice_id: Uuid, invoice: EditInvoiceEntity) -> Result<usize>;
    /// Returns the number of rows removed.
    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<usize>;
    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>>;
    async fn list_invoices(&self) -> Result<Vec<InvoiceListingRow>>;
}
