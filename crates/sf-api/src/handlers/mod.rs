//! API request handlers

pub mod auth;
pub mod board;
pub mod estimations;
pub mod policies;
pub mod projects;
pub mod quotations;
pub mod sales_orders;
pub mod users;

use serde::Serialize;
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

/// List response
#[derive(Debug, Serialize)]
pub struct Collection<T: Serialize> {
    #[serde(rename = "_type")]
    type_name: &'static str,
    total: usize,
    elements: Vec<T>,
}

impl<T: Serialize> From<Vec<T>> for Collection<T> {
    fn from(elements: Vec<T>) -> Self {
        Self {
            type_name: "Collection",
            total: elements.len(),
            elements,
        }
    }
}

/// Parse a wire name, reporting failures against `field`
pub(crate) fn parse_field<T: FromStr>(field: &str, value: &str) -> ApiResult<T> {
    value
        .parse()
        .map_err(|_| ApiError::invalid_field(field, format!("'{value}' is not a valid value")))
}
