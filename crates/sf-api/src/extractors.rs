//! Axum extractors for API handlers

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use sf_auth::{Authenticator, CurrentUser};
use sf_services::ServiceContext;
use std::sync::Arc;

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceContext,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(services: ServiceContext, auth: Arc<Authenticator>) -> Self {
        Self { services, auth }
    }
}

/// Authenticated user extractor
///
/// Reads the bearer token; the roles in its claims are the user's roles
/// for the whole request.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let user = app_state.auth.authenticate(header)?;
        tracing::debug!(user_id = user.id, login = %user.login, "authenticated request");
        Ok(AuthenticatedUser(user))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// JSON body whose rejections use the API error document
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);
