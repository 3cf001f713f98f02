//! Pipeline stages and the configured board
//!
//! The stage set is fixed; which stages appear on the board, and in which
//! order, is configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Stage of a project (opportunity) in the sales pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Prospect,
    MeetingScheduled,
    PreSales,
    ProposalDelivered,
    Won,
    Lost,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Prospect,
        PipelineStage::MeetingScheduled,
        PipelineStage::PreSales,
        PipelineStage::ProposalDelivered,
        PipelineStage::Won,
        PipelineStage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Prospect => "PROSPECT",
            PipelineStage::MeetingScheduled => "MEETING_SCHEDULED",
            PipelineStage::PreSales => "PRE_SALES",
            PipelineStage::ProposalDelivered => "PROPOSAL_DELIVERED",
            PipelineStage::Won => "WON",
            PipelineStage::Lost => "LOST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Prospect => "Prospect",
            PipelineStage::MeetingScheduled => "Meeting Scheduled",
            PipelineStage::PreSales => "Pre-Sales",
            PipelineStage::ProposalDelivered => "Proposal Delivered",
            PipelineStage::Won => "Won",
            PipelineStage::Lost => "Lost",
        }
    }

    /// Won and Lost end the lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Won | PipelineStage::Lost)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "pipeline stage",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("board must contain at least one stage")]
    Empty,
    #[error("stage {0} appears more than once")]
    Duplicate(PipelineStage),
    #[error(transparent)]
    UnknownStage(#[from] ParseEnumError),
}

/// Ordered set of stages shown on the Kanban board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    stages: Vec<PipelineStage>,
}

impl Board {
    pub fn new(stages: Vec<PipelineStage>) -> Result<Self, BoardError> {
        if stages.is_empty() {
            return Err(BoardError::Empty);
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(BoardError::Duplicate(*stage));
            }
        }
        Ok(Self { stages })
    }

    /// Build from configured wire names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, BoardError> {
        let stages = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<PipelineStage>, _>>()?;
        Self::new(stages)
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn contains(&self, stage: PipelineStage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn position(&self, stage: PipelineStage) -> Option<usize> {
        self.stages.iter().position(|s| *s == stage)
    }

    /// Stage that new projects start in
    pub fn first_stage(&self) -> PipelineStage {
        self.stages[0]
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            stages: PipelineStage::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wire_names() {
        assert_eq!(
            serde_json::to_string(&PipelineStage::ProposalDelivered).unwrap(),
            "\"PROPOSAL_DELIVERED\""
        );
        assert_eq!("won".parse::<PipelineStage>().unwrap(), PipelineStage::Won);
        assert!("CLOSED".parse::<PipelineStage>().is_err());
    }

    #[test]
    fn test_board_order() {
        let board = Board::from_names(&["PROSPECT", "PRE_SALES", "WON"]).unwrap();
        assert_eq!(board.first_stage(), PipelineStage::Prospect);
        assert_eq!(board.position(PipelineStage::PreSales), Some(1));
        assert!(!board.contains(PipelineStage::MeetingScheduled));
    }

    #[test]
    fn test_board_rejects_duplicates_and_empty() {
        assert_eq!(
            Board::new(vec![PipelineStage::Won, PipelineStage::Won]),
            Err(BoardError::Duplicate(PipelineStage::Won))
        );
        assert_eq!(Board::new(vec![]), Err(BoardError::Empty));
    }
}
