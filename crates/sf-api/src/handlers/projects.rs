//! Project API handlers
//!
//! Creation, edits, stage moves and the two ways a deal closes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sf_core::traits::Id;
use sf_models::PipelineStage;
use sf_services::estimations::{CreateEstimationService, EstimationQueries, NewEstimationParams};
use sf_services::pipeline::{
    CreateProjectService, DeleteOutcome, DeleteProjectService, MoveStageService, ProjectParams,
    ProjectQueries, UpdateProjectService,
};
use sf_services::quotations::QuotationQueries;
use sf_services::sales_orders::{CreateSalesOrderService, MarkLostService, SalesOrderParams};

use super::{parse_field, Collection};
use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, Payload};

/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let projects = ProjectQueries::new(&state.services, &user.0)
        .list()
        .await
        .into_result()?;
    Ok(Json(Collection::from(projects)))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Payload(params): Payload<ProjectParams>,
) -> ApiResult<impl IntoResponse> {
    let project = CreateProjectService::new(&state.services, &user.0)
        .call(params)
        .await
        .into_result()?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let project = ProjectQueries::new(&state.services, &user.0)
        .get(id)
        .await
        .into_result()?;
    Ok(Json(project))
}

/// PATCH /api/v1/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(params): Payload<ProjectParams>,
) -> ApiResult<impl IntoResponse> {
    let project = UpdateProjectService::new(&state.services, &user.0)
        .call(id, params)
        .await
        .into_result()?;
    Ok(Json(project))
}

/// DELETE /api/v1/projects/:id
///
/// 204 when the project is gone, 200 with the project when it had to be
/// closed as Lost instead.
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<Response> {
    let outcome = DeleteProjectService::new(&state.services, &user.0)
        .call(id)
        .await
        .into_result()?;
    Ok(match outcome {
        DeleteOutcome::Deleted { .. } => StatusCode::NO_CONTENT.into_response(),
        marked_lost @ DeleteOutcome::MarkedLost { .. } => Json(marked_lost).into_response(),
    })
}

/// POST /api/v1/projects/:id/move
pub async fn move_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(dto): Payload<MoveDto>,
) -> ApiResult<impl IntoResponse> {
    let target: PipelineStage = parse_field("new_status", &dto.new_status)?;
    let project = MoveStageService::new(&state.services, &user.0)
        .call(id, target)
        .await
        .into_result()?;
    Ok(Json(project))
}

/// GET /api/v1/projects/:id/actions
pub async fn project_actions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let actions = ProjectQueries::new(&state.services, &user.0)
        .actions(id)
        .await
        .into_result()?;
    Ok(Json(actions))
}

/// POST /api/v1/projects/:id/lost
pub async fn mark_lost(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(dto): Payload<LostDto>,
) -> ApiResult<impl IntoResponse> {
    let project = MarkLostService::new(&state.services, &user.0)
        .call(id, &dto.reason)
        .await
        .into_result()?;
    Ok(Json(project))
}

/// POST /api/v1/projects/:id/sales-orders
pub async fn create_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(params): Payload<SalesOrderParams>,
) -> ApiResult<impl IntoResponse> {
    let order = CreateSalesOrderService::new(&state.services, &user.0)
        .call(id, params)
        .await
        .into_result()?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/v1/projects/:id/estimations
pub async fn list_estimations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let estimations = EstimationQueries::new(&state.services, &user.0)
        .list(id)
        .await
        .into_result()?;
    Ok(Json(Collection::from(estimations)))
}

/// POST /api/v1/projects/:id/estimations
pub async fn create_estimation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Payload(params): Payload<NewEstimationParams>,
) -> ApiResult<impl IntoResponse> {
    let estimation = CreateEstimationService::new(&state.services, &user.0)
        .call(id, params)
        .await
        .into_result()?;
    Ok((StatusCode::CREATED, Json(estimation)))
}

/// GET /api/v1/projects/:id/quotations
pub async fn list_quotations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let quotations = QuotationQueries::new(&state.services, &user.0)
        .for_project(id)
        .await
        .into_result()?;
    Ok(Json(Collection::from(quotations)))
}

/// GET /api/v1/projects/:id/history
pub async fn project_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let journals = ProjectQueries::new(&state.services, &user.0)
        .history(id)
        .await
        .into_result()?;
    Ok(Json(Collection::from(journals)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDto {
    pub new_status: String,
}

#[derive(Debug, Deserialize)]
pub struct LostDto {
    #[serde(default)]
    pub reason: String,
}
