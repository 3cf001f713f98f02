//! Quotation API handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use sf_core::traits::Id;
use sf_services::quotations::QuotationQueries;

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser};

/// GET /api/v1/quotations/:id
pub async fn get_quotation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let quotation = QuotationQueries::new(&state.services, &user.0)
        .get(id)
        .await
        .into_result()?;
    Ok(Json(quotation))
}
