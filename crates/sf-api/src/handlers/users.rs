//! User API handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use sf_models::{DiscountPolicy, UserAccount};
use sf_services::discounts::PolicyService;
use sf_services::users::{CreateUserService, NewUserParams, UserQueries};

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, Payload};

/// GET /api/v1/users/me
///
/// The account plus what the token allows, including the discount limits
/// the user works under.
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let account = UserQueries::new(&state.services)
        .me(user.id)
        .await
        .into_result()?;
    let discount_policy = PolicyService::new(&state.services, &user.0)
        .mine()
        .await
        .into_result()?;

    Ok(Json(MeResponse {
        user: account,
        permissions: user.permissions(),
        discount_policy,
    }))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Payload(params): Payload<NewUserParams>,
) -> ApiResult<impl IntoResponse> {
    let account = CreateUserService::new(&state.services, &user.0)
        .call(params)
        .await
        .into_result()?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user: UserAccount,
    permissions: Vec<&'static str>,
    discount_policy: DiscountPolicy,
}
