//! Shared service plumbing

use std::sync::Arc;

use sf_core::config::{AppConfig, DiscountConfig};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_db::Stores;
use sf_journals::{Journal, JournalService};
use sf_models::{Board, BoardError, Estimation, Project};

/// Everything a service needs besides the acting user
#[derive(Clone)]
pub struct ServiceContext {
    pub stores: Stores,
    pub journals: Arc<JournalService>,
    pub board: Board,
    /// Limits used when none of a user's roles has a policy
    pub discount_defaults: DiscountConfig,
    pub password_min_length: usize,
}

impl ServiceContext {
    pub fn new(stores: Stores, journals: Arc<JournalService>, board: Board) -> Self {
        Self {
            stores,
            journals,
            board,
            discount_defaults: DiscountConfig {
                default_authority_limit: 0.0,
                default_max_limit: 100.0,
            },
            password_min_length: 10,
        }
    }

    /// Empty in-memory stores and the default board
    pub fn in_memory() -> Self {
        Self::new(
            Stores::memory(),
            Arc::new(JournalService::in_memory()),
            Board::default(),
        )
    }

    /// Board and limits taken from the application configuration
    pub fn from_config(
        config: &AppConfig,
        stores: Stores,
        journals: Arc<JournalService>,
    ) -> Result<Self, BoardError> {
        let board = Board::from_names(&config.pipeline.board_stages)?;
        let mut ctx = Self::new(stores, journals, board);
        ctx.discount_defaults = config.discount.clone();
        ctx.password_min_length = config.auth.password_min_length;
        Ok(ctx)
    }

    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn with_discount_defaults(mut self, authority_limit: f64, max_limit: f64) -> Self {
        self.discount_defaults = DiscountConfig {
            default_authority_limit: authority_limit,
            default_max_limit: max_limit,
        };
        self
    }

    pub(crate) async fn find_project(&self, id: Id) -> Result<Project, ValidationErrors> {
        tracing::debug!(project_id = id, "loading project");
        self.stores
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Project", id))
    }

    pub(crate) async fn find_estimation(&self, id: Id) -> Result<Estimation, ValidationErrors> {
        tracing::debug!(estimation_id = id, "loading estimation");
        self.stores
            .estimations
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Estimation", id))
    }

    /// Journal a transition that has already been persisted.
    ///
    /// A failing journal store is logged and does not undo the change.
    pub(crate) async fn journal(&self, journal: Journal) {
        let project_id = journal.project_id;
        let action = journal.action.as_str();
        if let Err(err) = self.journals.record(journal).await {
            tracing::error!(project_id, action, error = %err, "failed to record journal");
        }
    }
}

pub(crate) fn not_found(type_name: &str, id: Id) -> ValidationErrors {
    ValidationErrors::of_kind(
        sf_core::error::FailureKind::NotFound,
        format!("{type_name} with id {id} not found"),
    )
}

/// Log a refused command and pass the errors through
pub(crate) fn log_rejection(operation: &'static str, user_id: Id, errors: &ValidationErrors) {
    tracing::warn!(
        operation,
        user_id,
        kind = ?errors.kind,
        errors = %errors,
        "command rejected"
    );
}
