pub mod catalog;
pub mod invoices;
