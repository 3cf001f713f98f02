//! Stage move contract
//!
//! Moves follow the configured board order and nothing leaves Won or Lost.
//! A plain board move never closes a project: Won comes from creating a
//! sales order, Lost from marking it lost with a reason.

use sf_core::error::ValidationErrors;
use sf_models::{permissions, Board, PipelineStage};

use crate::base::{require_permission, Contract, UserContext, ValidationResult};

/// A requested move of one project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMove {
    pub from: PipelineStage,
    pub to: PipelineStage,
}

/// What an accepted move does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    /// Target equals the current stage
    Unchanged,
    Forward,
    /// Jump to Won or Lost; only the closing services act on this
    Close,
}

/// Check a move against the board, independent of who asks
pub fn check_transition(board: &Board, step: StageMove) -> Result<StageTransition, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let StageMove { from, to } = step;

    if !board.contains(to) {
        errors.add("new_status", format!("{to} is not a stage on the board"));
        return Err(errors);
    }
    if from == to {
        return Ok(StageTransition::Unchanged);
    }
    if from.is_terminal() {
        errors.reject(format!("Project is closed as {} and cannot be moved", from.label()));
        return Err(errors);
    }
    if to.is_terminal() {
        return Ok(StageTransition::Close);
    }

    match (board.position(from), board.position(to)) {
        (Some(current), Some(target)) if target < current => {
            errors.reject(format!(
                "Cannot move a project back from {} to {}",
                from.label(),
                to.label()
            ));
            Err(errors)
        }
        _ => Ok(StageTransition::Forward),
    }
}

fn closing_hint(to: PipelineStage) -> String {
    match to {
        PipelineStage::Won => "A project is marked Won by creating its sales order".to_string(),
        _ => format!("A project is marked {} with a reason", to.label()),
    }
}

/// Contract for moving a project on the board
pub struct MoveStageContract<'a, U: UserContext> {
    user: &'a U,
    board: &'a Board,
}

impl<'a, U: UserContext> MoveStageContract<'a, U> {
    pub fn new(user: &'a U, board: &'a Board) -> Self {
        Self { user, board }
    }

    /// Validate and classify in one pass
    pub fn check(&self, step: StageMove) -> Result<StageTransition, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::MOVE_PROJECTS, "move projects", &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        match check_transition(self.board, step)? {
            StageTransition::Close => {
                errors.reject(closing_hint(step.to));
                Err(errors)
            }
            transition => Ok(transition),
        }
    }
}

impl<'a, U: UserContext> Contract<StageMove> for MoveStageContract<'a, U> {
    fn validate(&self, step: &StageMove) -> ValidationResult {
        self.check(*step).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::error::FailureKind;
    use sf_core::traits::Id;
    use sf_models::Role;
    use PipelineStage::*;

    struct MockUser {
        roles: Vec<Role>,
    }

    impl UserContext for MockUser {
        fn id(&self) -> Id {
            9
        }
        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    fn step(from: PipelineStage, to: PipelineStage) -> StageMove {
        StageMove { from, to }
    }

    #[test]
    fn test_forward_and_terminal_jumps() {
        let board = Board::default();
        assert_eq!(check_transition(&board, step(Prospect, PreSales)).unwrap(), StageTransition::Forward);
        assert_eq!(check_transition(&board, step(Prospect, Won)).unwrap(), StageTransition::Close);
        assert_eq!(check_transition(&board, step(PreSales, Lost)).unwrap(), StageTransition::Close);
        assert_eq!(check_transition(&board, step(PreSales, PreSales)).unwrap(), StageTransition::Unchanged);
    }

    #[test]
    fn test_backward_move_is_rejected() {
        let board = Board::default();
        let errors = check_transition(&board, step(ProposalDelivered, MeetingScheduled)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
    }

    #[test]
    fn test_closed_projects_stay_closed() {
        let board = Board::default();
        assert!(check_transition(&board, step(Won, Lost)).is_err());
        assert!(check_transition(&board, step(Lost, Prospect)).is_err());
    }

    #[test]
    fn test_stage_removed_from_board_is_rejected() {
        let board = Board::new(vec![Prospect, PreSales, ProposalDelivered, Won, Lost]).unwrap();
        let errors = check_transition(&board, step(Prospect, MeetingScheduled)).unwrap_err();
        assert!(errors.has_error("new_status"));
        assert_eq!(errors.kind, FailureKind::Invalid);
    }

    #[test]
    fn test_permission_checked_first() {
        let board = Board::default();
        let finance = MockUser {
            roles: vec![Role::Finance],
        };
        let errors = MoveStageContract::new(&finance, &board)
            .validate(&step(Prospect, PreSales))
            .unwrap_err();
        assert_eq!(errors.kind, FailureKind::Forbidden);

        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        assert!(MoveStageContract::new(&sales, &board)
            .validate(&step(Prospect, PreSales))
            .is_ok());
    }

    #[test]
    fn test_board_move_cannot_close() {
        let board = Board::default();
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        let contract = MoveStageContract::new(&sales, &board);

        let errors = contract.check(step(Prospect, Won)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
        assert_eq!(
            errors.first_message().as_deref(),
            Some("A project is marked Won by creating its sales order")
        );

        let errors = contract.check(step(ProposalDelivered, Lost)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
        assert_eq!(
            errors.first_message().as_deref(),
            Some("A project is marked Lost with a reason")
        );

        assert_eq!(contract.check(step(Won, Won)).unwrap(), StageTransition::Unchanged);
    }
}
