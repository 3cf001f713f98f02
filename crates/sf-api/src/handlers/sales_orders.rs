//! Sales order API handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use sf_core::traits::Id;
use sf_services::sales_orders::SalesOrderQueries;

use super::Collection;
use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser};

/// GET /api/v1/sales-orders
pub async fn list_sales_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let orders = SalesOrderQueries::new(&state.services, &user.0)
        .list()
        .await
        .into_result()?;
    Ok(Json(Collection::from(orders)))
}

/// GET /api/v1/sales-orders/:id
pub async fn get_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let order = SalesOrderQueries::new(&state.services, &user.0)
        .get(id)
        .await
        .into_result()?;
    Ok(Json(order))
}
