//! Side-by-side runs of both engines on the same endpoints.

use crate::astar::{SearchPath, SearchSession};
use crate::config::{AStarConfig, NavConfig};
use crate::error::Result;
use crate::grid::GridView;
use crate::qlearning::{AutoTrainSummary, QLearningAgent};
use crate::random::RandomSource;
use crate::types::Location;
use log::info;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::{Duration, Instant};

/// A timed A* search.
#[derive(Debug, Clone, Serialize)]
pub struct AStarRun {
    pub path: SearchPath,
    pub elapsed: Duration,
}

/// A timed auto-train sequence.
#[derive(Debug, Clone, Serialize)]
pub struct QLearningRun {
    pub summary: AutoTrainSummary,
    pub elapsed: Duration,
}

impl QLearningRun {
    pub fn path(&self) -> Option<&[Location]> {
        self.summary.final_path.as_deref()
    }
}

/// Both runs for one pair of endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub start: Location,
    pub goal: Location,
    pub astar: AStarRun,
    pub qlearning: QLearningRun,
}

impl ComparisonReport {
    pub fn astar_steps(&self) -> usize {
        self.astar.path.steps()
    }

    /// Moves on the learned route, if training succeeded.
    pub fn qlearning_steps(&self) -> Option<usize> {
        self.qlearning.path().map(|p| p.len().saturating_sub(1))
    }

    /// Extra moves the learned route takes over the A* route.
    pub fn step_overhead(&self) -> Option<i64> {
        self.qlearning_steps()
            .map(|q| q as i64 - self.astar_steps() as i64)
    }
}

/// Runs A* and Q-learning against one grid, keeping their endpoints in sync.
pub struct Comparator<G, R = StdRng> {
    agent: QLearningAgent<G, R>,
    astar: AStarConfig,
}

impl<G: GridView> Comparator<G, StdRng> {
    pub fn new(grid: G, config: NavConfig) -> Self {
        Self {
            agent: QLearningAgent::new(grid, config.qlearning),
            astar: config.astar,
        }
    }
}

impl<G: GridView, R: RandomSource> Comparator<G, R> {
    /// Wraps an existing agent.
    pub fn with_agent(agent: QLearningAgent<G, R>, astar: AStarConfig) -> Self {
        Self { agent, astar }
    }

    /// Returns the Q-learning agent.
    pub fn agent(&self) -> &QLearningAgent<G, R> {
        &self.agent
    }

    /// Returns the Q-learning agent mutably.
    pub fn agent_mut(&mut self) -> &mut QLearningAgent<G, R> {
        &mut self.agent
    }

    pub fn set_endpoints(&mut self, start: Location, goal: Location) -> Result<()> {
        self.agent.set_endpoints(start, goal)
    }

    pub fn randomize_endpoints(&mut self) -> Result<(Location, Location)> {
        self.agent.randomize_endpoints()
    }

    pub fn run_astar(&self) -> Result<AStarRun> {
        let (start, goal) = self.agent.endpoints()?;
        let timer = Instant::now();
        let mut session =
            SearchSession::with_config(self.agent.grid(), start, goal, self.astar.clone())?;
        let path = session.run_to_completion()?;
        Ok(AStarRun {
            path,
            elapsed: timer.elapsed(),
        })
    }

    pub fn run_qlearning(&mut self) -> Result<QLearningRun> {
        let timer = Instant::now();
        let summary = self.agent.start_auto_train()?.finish();
        Ok(QLearningRun {
            summary,
            elapsed: timer.elapsed(),
        })
    }

    /// Runs A* first, then auto-trains the agent on the same endpoints.
    pub fn compare(&mut self) -> Result<ComparisonReport> {
        let (start, goal) = self.agent.endpoints()?;
        let astar = self.run_astar()?;
        let qlearning = self.run_qlearning()?;

        let report = ComparisonReport {
            start,
            goal,
            astar,
            qlearning,
        };
        info!(
            "Compare {} -> {}: A* {} steps in {:?}, Q-learning {:?} steps in {:?} ({} attempts)",
            start,
            goal,
            report.astar_steps(),
            report.astar.elapsed,
            report.qlearning_steps(),
            report.qlearning.elapsed,
            report.qlearning.summary.attempts
        );
        Ok(report)
    }
}
