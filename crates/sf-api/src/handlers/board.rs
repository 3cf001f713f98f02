//! Kanban board handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sf_core::traits::Id;
use sf_models::PipelineStage;
use sf_services::pipeline::{BoardColumn, BoardService, BoardSummary};

use super::parse_field;
use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, Payload};

/// GET /api/v1/board
pub async fn get_board(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let board = BoardService::new(&state.services, &user.0)
        .load()
        .await
        .into_result()?;
    Ok(Json(BoardResponse {
        columns: board.columns(),
        summary: board.summary(),
    }))
}

/// GET /api/v1/board/summary
pub async fn get_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let summary = BoardService::new(&state.services, &user.0)
        .summary()
        .await
        .into_result()?;
    Ok(Json(summary))
}

/// POST /api/v1/board/moves
///
/// A refused move still answers 200: the body says it was reverted and
/// carries the columns as they are after the revert.
pub async fn move_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Payload(dto): Payload<BoardMoveDto>,
) -> ApiResult<impl IntoResponse> {
    let target: PipelineStage = parse_field("new_status", &dto.new_status)?;
    let outcome = BoardService::new(&state.services, &user.0)
        .move_optimistic(dto.project_id, target)
        .await
        .into_result()?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMoveDto {
    pub project_id: Id,
    pub new_status: String,
}

#[derive(Debug, Serialize)]
struct BoardResponse {
    columns: Vec<BoardColumn>,
    summary: BoardSummary,
}
