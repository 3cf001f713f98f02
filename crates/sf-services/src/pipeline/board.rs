//! Kanban board state
//!
//! The board is loaded once, moves are applied to it optimistically, and
//! the store's answer either confirms or reverts the move. All of it goes
//! through [`BoardState::apply`] so the columns and their totals can never
//! disagree with the projects they hold.

use serde::Serialize;
use sf_contracts::base::{require_permission, UserContext};
use sf_core::error::{FailureKind, ValidationErrors};
use sf_core::traits::Id;
use sf_core::types::round_money;
use sf_models::{permissions, Board, PipelineStage, Project};

use super::MoveStageService;
use crate::base::{not_found, ServiceContext};
use crate::result::ServiceResult;

/// One column as rendered by clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: PipelineStage,
    pub label: &'static str,
    pub count: usize,
    pub total: f64,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: PipelineStage,
    pub count: usize,
    pub total: f64,
}

/// Read-only per-stage figures for the configured board
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub stages: Vec<StageSummary>,
    pub project_count: usize,
    pub total_value: f64,
}

/// A move that has been applied locally but not yet settled
#[derive(Debug, Clone)]
pub struct MoveCommand {
    pub project_id: Id,
    pub target: PipelineStage,
    prior: Project,
    prior_index: usize,
}

impl MoveCommand {
    pub fn prior_stage(&self) -> PipelineStage {
        self.prior.stage
    }
}

enum BoardAction<'c> {
    Move(&'c MoveCommand),
    Confirm(Project),
    Revert(&'c MoveCommand),
}

#[derive(Debug, Clone)]
pub struct BoardState {
    columns: Vec<(PipelineStage, Vec<Project>)>,
    /// Projects whose stage is not on the board
    off_board: Vec<Project>,
}

impl BoardState {
    pub fn load(board: &Board, projects: Vec<Project>) -> Self {
        let mut state = Self {
            columns: board.stages().iter().map(|stage| (*stage, Vec::new())).collect(),
            off_board: Vec::new(),
        };
        for project in projects {
            state.insert(project, None);
        }
        state
    }

    pub fn column(&self, stage: PipelineStage) -> &[Project] {
        self.columns
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, projects)| projects.as_slice())
            .unwrap_or(&[])
    }

    pub fn off_board(&self) -> &[Project] {
        &self.off_board
    }

    /// Sum of contract value, falling back to estimated value, per project
    pub fn column_total(&self, stage: PipelineStage) -> f64 {
        round_money(self.column(stage).iter().map(Project::board_value).sum())
    }

    pub fn find(&self, project_id: Id) -> Option<&Project> {
        self.columns
            .iter()
            .flat_map(|(_, projects)| projects.iter())
            .chain(self.off_board.iter())
            .find(|p| p.id == Some(project_id))
    }

    /// Snapshot the project and move it to `target` right away
    pub fn begin_move(&mut self, project_id: Id, target: PipelineStage) -> Option<MoveCommand> {
        let (prior, prior_index) = self.locate(project_id)?;
        let command = MoveCommand {
            project_id,
            target,
            prior,
            prior_index,
        };
        self.apply(BoardAction::Move(&command));
        Some(command)
    }

    /// Replace the optimistic copy with what the store returned
    pub fn confirm(&mut self, command: MoveCommand, persisted: Project) {
        debug_assert_eq!(persisted.id, Some(command.project_id));
        self.apply(BoardAction::Confirm(persisted));
    }

    /// Put the project back exactly where it was
    pub fn revert(&mut self, command: MoveCommand) {
        self.apply(BoardAction::Revert(&command));
    }

    fn apply(&mut self, action: BoardAction<'_>) {
        match action {
            BoardAction::Move(command) => {
                if let Some(mut project) = self.take(command.project_id) {
                    project.stage = command.target;
                    self.insert(project, None);
                }
            }
            BoardAction::Confirm(project) => {
                if let Some(id) = project.id {
                    self.take(id);
                }
                self.insert(project, None);
            }
            BoardAction::Revert(command) => {
                self.take(command.project_id);
                self.insert(command.prior.clone(), Some(command.prior_index));
            }
        }
    }

    fn locate(&self, project_id: Id) -> Option<(Project, usize)> {
        self.columns
            .iter()
            .map(|(_, projects)| projects)
            .chain(std::iter::once(&self.off_board))
            .find_map(|projects| {
                projects
                    .iter()
                    .position(|p| p.id == Some(project_id))
                    .map(|index| (projects[index].clone(), index))
            })
    }

    fn take(&mut self, project_id: Id) -> Option<Project> {
        let lists = self
            .columns
            .iter_mut()
            .map(|(_, projects)| projects)
            .chain(std::iter::once(&mut self.off_board));
        for projects in lists {
            if let Some(index) = projects.iter().position(|p| p.id == Some(project_id)) {
                return Some(projects.remove(index));
            }
        }
        None
    }

    fn insert(&mut self, project: Project, index: Option<usize>) {
        let list = match self.columns.iter_mut().find(|(s, _)| *s == project.stage) {
            Some((_, projects)) => projects,
            None => &mut self.off_board,
        };
        let at = index.unwrap_or(list.len()).min(list.len());
        list.insert(at, project);
    }

    pub fn columns(&self) -> Vec<BoardColumn> {
        self.columns
            .iter()
            .map(|(stage, projects)| BoardColumn {
                stage: *stage,
                label: stage.label(),
                count: projects.len(),
                total: self.column_total(*stage),
                projects: projects.clone(),
            })
            .collect()
    }

    pub fn summary(&self) -> BoardSummary {
        let stages: Vec<StageSummary> = self
            .columns
            .iter()
            .map(|(stage, projects)| StageSummary {
                stage: *stage,
                count: projects.len(),
                total: self.column_total(*stage),
            })
            .collect();
        BoardSummary {
            project_count: stages.iter().map(|s| s.count).sum(),
            total_value: round_money(stages.iter().map(|s| s.total).sum()),
            stages,
        }
    }
}

/// Result of an optimistic move, as seen by the board
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMove {
    pub accepted: bool,
    pub project_id: Id,
    /// The store's refusal, unchanged
    pub message: Option<String>,
    pub columns: Vec<BoardColumn>,
}

pub struct BoardService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> BoardService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn load(&self) -> ServiceResult<BoardState> {
        self.load_state().await.into()
    }

    pub async fn summary(&self) -> ServiceResult<BoardSummary> {
        self.load().await.map(|state| state.summary())
    }

    /// Move on the loaded board first, then persist; a refused move is reverted
    pub async fn move_optimistic(&self, project_id: Id, target: PipelineStage) -> ServiceResult<BoardMove> {
        self.settle_move(project_id, target).await.into()
    }

    async fn load_state(&self) -> Result<BoardState, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_PIPELINE, "view the pipeline", &mut errors);
        errors.into_result()?;

        let projects = self.ctx.stores.projects.find_all().await?;
        Ok(BoardState::load(&self.ctx.board, projects))
    }

    async fn settle_move(&self, project_id: Id, target: PipelineStage) -> Result<BoardMove, ValidationErrors> {
        let mut state = self.load_state().await?;
        let command = state
            .begin_move(project_id, target)
            .ok_or_else(|| not_found("Project", project_id))?;

        let result = MoveStageService::new(self.ctx, self.user)
            .call(project_id, target)
            .await
            .into_result();

        let message = match result {
            Ok(project) => {
                state.confirm(command, project);
                None
            }
            Err(errors) if errors.kind == FailureKind::Forbidden => return Err(errors),
            Err(errors) => {
                tracing::debug!(project_id, from = %command.prior_stage(), to = %target, "reverting board move");
                state.revert(command);
                Some(errors.first_message().unwrap_or_else(|| errors.to_string()))
            }
        };

        Ok(BoardMove {
            accepted: message.is_none(),
            project_id,
            message,
            columns: state.columns(),
        })
    }
}
