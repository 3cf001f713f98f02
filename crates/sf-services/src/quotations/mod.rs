//! Quotation services

mod generate;

pub use generate::{GenerateQuotationService, QuotationQueries};
