use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::invoices::{EditInvoiceEntity, InsertInvoiceEntity},
    value_objects::{action_state::FieldErrors, enums::invoice_statuses::InvoiceStatus},
};

pub const CUSTOMER_ID_FIELD: &str = "customerId";
pub const AMOUNT_FIELD: &str = "amount";
pub const STATUS_FIELD: &str = "status";

pub const CUSTOMER_REQUIRED: &str = "Please select a customer.";
pub const AMOUNT_GREATER_THAN_ZERO: &str = "Please enter an amount greater than $0.";
pub const AMOUNT_NOT_A_NUMBER: &str = "Expected number, received nan";
pub const AMOUNT_TOO_LARGE: &str = "Please enter a smaller amount.";
pub const STATUS_REQUIRED: &str = "Please select an invoice status.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    InvalidType,
    RangeError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub kind: IssueKind,
    pub message: &'static str,
}

impl FieldIssue {
    fn invalid_type(field: &'static str, message: &'static str) -> Self {
        Self {
            field,
            kind: IssueKind::InvalidType,
            message,
        }
    }

    fn range(field: &'static str, message: &'static str) -> Self {
        Self {
            field,
            kind: IssueKind::RangeError,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invoice form failed validation on {} field(s)", .issues.len())]
pub struct ValidationFailure {
    pub issues: Vec<FieldIssue>,
}

impl ValidationFailure {
    /// Groups the issues by field, keeping the order they were raised in.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for issue in &self.issues {
            errors
                .entry(issue.field.to_string())
                .or_default()
                .push(issue.message.to_string());
        }
        errors
    }
}

/// Raw invoice form fields as submitted. Anything else in the payload (`id`, `date`)
/// is ignored on purpose.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceForm {
    pub customer_id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInvoice {
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub amount_minor: i32,
    pub status: InvoiceStatus,
}

impl ValidatedInvoice {
    pub fn to_insert_entity(&self, date: NaiveDate) -> InsertInvoiceEntity {
        InsertInvoiceEntity {
            customer_id: self.customer_id,
            amount: self.amount_minor,
            status: self.status.to_string(),
            date,
        }
    }

    pub fn to_edit_entity(&self) -> EditInvoiceEntity {
        EditInvoiceEntity {
            customer_id: self.customer_id,
            amount: self.amount_minor,
            status: self.status.to_string(),
        }
    }
}

impl InvoiceForm {
    /// Checks every field in one pass and reports all failures together.
    pub fn validate(&self) -> Result<ValidatedInvoice, ValidationFailure> {
        let customer_id = parse_customer_id(self.customer_id.as_deref());
        let amount = coerce_amount(self.amount.as_deref());
        let status = parse_status(self.status.as_deref());

        match (customer_id, amount, status) {
            (Ok(customer_id), Ok((amount, amount_minor)), Ok(status)) => Ok(ValidatedInvoice {
                customer_id,
                amount,
                amount_minor,
                status,
            }),
            (customer_id, amount, status) => {
                let issues = [customer_id.err(), amount.err(), status.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                Err(ValidationFailure { issues })
            }
        }
    }
}

fn parse_customer_id(raw: Option<&str>) -> Result<Uuid, FieldIssue> {
    let required = || FieldIssue::invalid_type(CUSTOMER_ID_FIELD, CUSTOMER_REQUIRED);

    let value = raw.map(str::trim).filter(|value| !value.is_empty());
    let value = value.ok_or_else(required)?;
    Uuid::parse_str(value).map_err(|_| required())
}

/// Coerces like a numeric form field: blank means zero, anything that is not a plain
/// decimal literal is not a number. Minor units are computed on the exact decimal.
fn coerce_amount(raw: Option<&str>) -> Result<(Decimal, i32), FieldIssue> {
    let trimmed = raw.unwrap_or_default().trim();

    let amount = if trimmed.is_empty() {
        Decimal::ZERO
    } else {
        let literal = DecimalLiteral::parse(trimmed)
            .ok_or_else(|| FieldIssue::invalid_type(AMOUNT_FIELD, AMOUNT_NOT_A_NUMBER))?;
        literal.to_decimal()?
    };

    if amount <= Decimal::ZERO {
        return Err(FieldIssue::range(AMOUNT_FIELD, AMOUNT_GREATER_THAN_ZERO));
    }

    let amount_minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i32())
        .ok_or_else(|| FieldIssue::range(AMOUNT_FIELD, AMOUNT_TOO_LARGE))?;

    if amount_minor <= 0 {
        return Err(FieldIssue::range(AMOUNT_FIELD, AMOUNT_GREATER_THAN_ZERO));
    }

    Ok((amount, amount_minor))
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with either side of the point allowed to be
/// empty but not both. No separators, radix prefixes or `Infinity`.
#[derive(Debug, PartialEq)]
struct DecimalLiteral<'a> {
    negative: bool,
    whole: &'a str,
    fraction: &'a str,
    exponent: Option<(bool, &'a str)>,
}

impl<'a> DecimalLiteral<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let (negative, unsigned) = split_sign(raw);
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, Some(split_sign(exponent))),
            None => (unsigned, None),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        let mantissa_ok = !(whole.is_empty() && fraction.is_empty())
            && digits(whole)
            && digits(fraction);
        let exponent_ok =
            exponent.is_none_or(|(_, exponent)| !exponent.is_empty() && digits(exponent));

        (mantissa_ok && exponent_ok).then_some(Self {
            negative,
            whole,
            fraction,
            exponent,
        })
    }

    /// A literal too small to represent is zero; too large is out of range.
    fn to_decimal(&self) -> Result<Decimal, FieldIssue> {
        let whole = if self.whole.is_empty() { "0" } else { self.whole };
        let fraction = if self.fraction.is_empty() { "0" } else { self.fraction };

        let parsed = match self.exponent {
            None => Decimal::from_str(&format!("{whole}.{fraction}")),
            Some((negative, exponent)) => {
                let sign = if negative { "-" } else { "" };
                Decimal::from_scientific(&format!("{whole}.{fraction}e{sign}{exponent}"))
            }
        };

        let magnitude = match parsed {
            Ok(magnitude) => magnitude,
            Err(_) if matches!(self.exponent, Some((true, _))) => Decimal::ZERO,
            Err(_) => return Err(FieldIssue::range(AMOUNT_FIELD, AMOUNT_TOO_LARGE)),
        };

        Ok(if self.negative { -magnitude } else { magnitude })
    }
}

fn split_sign(raw: &str) -> (bool, &str) {
    match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    }
}

fn parse_status(raw: Option<&str>) -> Result<InvoiceStatus, FieldIssue> {
    raw.and_then(InvoiceStatus::parse)
        .ok_or_else(|| FieldIssue::invalid_type(STATUS_FIELD, STATUS_REQUIRED))
}
