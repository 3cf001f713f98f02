//! Discount policy handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sf_models::Role;
use sf_services::discounts::PolicyService;

use super::{parse_field, Collection};
use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, Payload};

/// GET /api/v1/discount-policies
pub async fn list_policies(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let policies = PolicyService::new(&state.services, &user.0)
        .list()
        .await
        .into_result()?;
    Ok(Json(Collection::from(policies)))
}

/// PUT /api/v1/discount-policies/:role
pub async fn upsert_policy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(role): Path<String>,
    Payload(dto): Payload<PolicyDto>,
) -> ApiResult<impl IntoResponse> {
    let role: Role = parse_field("role", &role)?;
    let policy = PolicyService::new(&state.services, &user.0)
        .upsert(role, dto.authority_limit, dto.max_limit)
        .await
        .into_result()?;
    Ok(Json(policy))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDto {
    pub authority_limit: f64,
    pub max_limit: f64,
}
