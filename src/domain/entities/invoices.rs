use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::invoices;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoices)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: i32,
    pub status: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = invoices)]
pub struct InsertInvoiceEntity {
    pub customer_id: Uuid,
    pub amount: i32,
    pub status: String,
    pub date: NaiveDate,
}

/// Columns an update may touch. `id` and `date` are deliberately absent.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = invoices)]
pub struct EditInvoiceEntity {
    pub customer_id: Uuid,
    pub amount: i32,
    pub status: String,
}

/// A listing row: the invoice plus the customer it is billed to.
#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct InvoiceListingRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: i32,
    pub status: String,
    pub date: NaiveDate,
    pub customer_name: String,
    pub customer_email: String,
}
