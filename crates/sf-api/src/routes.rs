//! API routes

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::{
    auth, board, estimations, policies, projects, quotations, sales_orders, users,
};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/auth/login", post(auth::login))
        .route("/users", post(users::create_user))
        .route("/users/me", get(users::me))
        .nest("/board", board_router())
        .nest("/projects", projects_router())
        .nest("/estimations", estimations_router())
        .route("/quotations/:id", get(quotations::get_quotation))
        .route("/sales-orders", get(sales_orders::list_sales_orders))
        .route("/sales-orders/:id", get(sales_orders::get_sales_order))
        .route("/discount-policies", get(policies::list_policies))
        .route("/discount-policies/:role", put(policies::upsert_policy))
}

fn board_router() -> Router<AppState> {
    Router::new()
        .route("/", get(board::get_board))
        .route("/summary", get(board::get_summary))
        .route("/moves", post(board::move_card))
}

fn projects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/:id/move", post(projects::move_project))
        .route("/:id/actions", get(projects::project_actions))
        .route("/:id/lost", post(projects::mark_lost))
        .route("/:id/sales-orders", post(projects::create_sales_order))
        .route(
            "/:id/estimations",
            get(projects::list_estimations).post(projects::create_estimation),
        )
        .route("/:id/quotations", get(projects::list_quotations))
        .route("/:id/history", get(projects::project_history))
}

fn estimations_router() -> Router<AppState> {
    Router::new()
        .route(
            "/:id",
            get(estimations::get_estimation).patch(estimations::update_estimation),
        )
        .route("/:id/discount-request", post(estimations::request_discount))
        .route("/:id/discount-decision", post(estimations::decide_discount))
        .route("/:id/quotation", post(estimations::generate_quotation))
}

async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        type_name: "Root",
        instance_name: "SalesFlow",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoot {
    #[serde(rename = "_type")]
    type_name: &'static str,
    instance_name: &'static str,
    version: &'static str,
}
