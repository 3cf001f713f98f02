//! Sign-in

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sf_auth::AuthError;
use sf_models::UserAccount;
use sf_services::users::authenticate;

use crate::error::ApiResult;
use crate::extractors::{AppState, Payload};

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Payload(dto): Payload<LoginDto>,
) -> ApiResult<impl IntoResponse> {
    let account = authenticate(&state.services, &dto.login, &dto.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let jwt = state.auth.jwt();
    let token = jwt.create_token(&account).map_err(AuthError::from)?;
    tracing::info!(user_id = account.id, login = %account.login, "signed in");

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: jwt.expires_in_seconds(),
        user: account,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginDto {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    token_type: &'static str,
    expires_in: u64,
    user: UserAccount,
}
