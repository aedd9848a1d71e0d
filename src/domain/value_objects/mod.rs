pub mod action_state;
pub mod enums;
pub mod iam;
pub mod invoice_form;
pub mod invoices;
