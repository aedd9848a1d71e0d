use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::invoices::{InvoiceEntity, InvoiceListingRow},
    value_objects::enums::invoice_statuses::InvoiceStatus,
};

pub const INVOICES_PATH: &str = "/dashboard/invoices";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Minor units.
    pub amount: i32,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl TryFrom<InvoiceEntity> for InvoiceModel {
    type Error = anyhow::Error;

    fn try_from(entity: InvoiceEntity) -> Result<Self> {
        Ok(Self {
            id: entity.id,
            customer_id: entity.customer_id,
            amount: entity.amount,
            status: parse_stored_status(&entity.status)?,
            date: entity.date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListingModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: i32,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl TryFrom<InvoiceListingRow> for InvoiceListingModel {
    type Error = anyhow::Error;

    fn try_from(row: InvoiceListingRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            amount: row.amount,
            status: parse_stored_status(&row.status)?,
            date: row.date,
        })
    }
}

fn parse_stored_status(raw: &str) -> Result<InvoiceStatus> {
    InvoiceStatus::parse(raw).ok_or_else(|| anyhow!("Unknown invoice status stored: {}", raw))
}
