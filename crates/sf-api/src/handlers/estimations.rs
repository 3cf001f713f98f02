//! Estimation API handlers
//!
//! Engineering edits, the discount round trip, and quotation generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sf_core::traits::Id;
use sf_core::types::lenient_amount;
use sf_models::DiscountDecision;
use sf_services::discounts::{DecideDiscountService, RequestDiscountService};
use sf_services::estimations::{EstimationParams, EstimationQueries, UpdateEstimationService};
use sf_services::quotations::GenerateQuotationService;

use super::parse_field;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, Payload};

/// GET /api/v1/estimations/:id
pub async fn get_estimation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let estimation = EstimationQueries::new(&state.services, &user.0)
        .get(id)
        .await
        .into_result()?;
    Ok(Json(estimation))
}

/// PATCH /api/v1/estimations/:id
pub async fn update_estimation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(params): Payload<EstimationParams>,
) -> ApiResult<impl IntoResponse> {
    let estimation = UpdateEstimationService::new(&state.services, &user.0)
        .call(id, params)
        .await
        .into_result()?;
    Ok(Json(estimation))
}

/// POST /api/v1/estimations/:id/discount-request
pub async fn request_discount(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(dto): Payload<DiscountRequestDto>,
) -> ApiResult<impl IntoResponse> {
    let percent = dto
        .percent
        .ok_or_else(|| ApiError::invalid_field("percent", "must be a number"))?;
    let estimation = RequestDiscountService::new(&state.services, &user.0)
        .call(id, percent)
        .await
        .into_result()?;
    Ok(Json(estimation))
}

/// POST /api/v1/estimations/:id/discount-decision
pub async fn decide_discount(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(dto): Payload<DiscountDecisionDto>,
) -> ApiResult<impl IntoResponse> {
    let decision: DiscountDecision = parse_field("decision", &dto.decision)?;
    let estimation = DecideDiscountService::new(&state.services, &user.0)
        .call(id, decision)
        .await
        .into_result()?;
    Ok(Json(estimation))
}

/// POST /api/v1/estimations/:id/quotation
pub async fn generate_quotation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(dto): Payload<QuotationDto>,
) -> ApiResult<impl IntoResponse> {
    let quotation = GenerateQuotationService::new(&state.services, &user.0)
        .call(id, dto.discount_percent.unwrap_or(0.0))
        .await
        .into_result()?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequestDto {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountDecisionDto {
    pub decision: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDto {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount_percent: Option<f64>,
}
