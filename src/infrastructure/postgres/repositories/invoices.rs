use anyhow::Result;
use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::invoices::{
            EditInvoiceEntity, InsertInvoiceEntity, InvoiceEntity, InvoiceListingRow,
        },
        repositories::invoices::InvoiceRepository,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{customers, invoices},
    },
};

pub struct InvoicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl InvoicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl InvoiceRepository for InvoicePostgres {
    async fn create_invoice(&self, invoice: InsertInvoiceEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let invoice_id = insert_into(invoices::table)
            .values(&invoice)
            .returning(invoices::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(invoice_id)
    }

    async fn update_invoice(&self, invoice_id: Uuid, invoice: EditInvoiceEntity) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let matched = update(invoices::table.filter(invoices::id.eq(invoice_id)))
            .set(&invoice)
            .execute(&mut conn)?;

        Ok(matched)
    }

    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(invoices::table.filter(invoices::id.eq(invoice_id)))
            .execute(&mut conn)?;

        Ok(deleted)
    }

    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let invoice = invoices::table
            .filter(invoices::id.eq(invoice_id))
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(invoice)
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceListingRow>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = invoices::table
            .inner_join(customers::table)
            .select((
                invoices::id,
                invoices::customer_id,
                invoices::amount,
                invoices::status,
                invoices::date,
                customers::name,
                customers::email,
            ))
            .order((invoices::date.desc(), invoices::id.asc()))
            .load::<InvoiceListingRow>(&mut conn)?;

        Ok(rows)
    }
}
