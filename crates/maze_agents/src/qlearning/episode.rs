//! Episode and training reports.

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// How a training episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    /// The agent stood next to the goal; the goal was appended to the path.
    GoalReached,
    /// No usable neighbour remained; the location was marked as a dead end.
    DeadEnd(Location),
    /// The chosen move led back to an already visited location.
    Trapped(Location),
}

impl EpisodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EpisodeOutcome::GoalReached)
    }
}

/// Result of one [`train_once`](crate::QLearningAgent::train_once) call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub outcome: EpisodeOutcome,
    /// Table updates performed.
    pub steps: usize,
    /// Loop iterations, including the terminating one.
    pub iterations: u32,
    /// Visited locations in order, starting at the start location.
    pub path: Vec<Location>,
    /// Learning rate used for every update of the episode.
    pub learning_rate: f64,
}

/// Result of one auto-train attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// 1-based attempt number within the sequence.
    pub attempt: u32,
    pub episode: EpisodeReport,
    /// Route of the greedy verification rollout, if it reached the goal.
    pub verified_path: Option<Vec<Location>>,
}

impl AttemptReport {
    pub fn is_success(&self) -> bool {
        self.verified_path.is_some()
    }
}

/// Totals of a finished auto-train sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoTrainSummary {
    pub success: bool,
    pub attempts: u32,
    /// Sum of episode iterations over all attempts.
    pub total_iterations: u64,
    pub cancelled: bool,
    /// Verified route of the successful attempt.
    pub final_path: Option<Vec<Location>>,
}
