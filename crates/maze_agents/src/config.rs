//! Configuration for the navigation engines.
//!
//! Values default to the constants the Q-learning agent was tuned with. A
//! whole [`NavConfig`] can be read from TOML; missing keys keep their
//! defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for both engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub astar: AStarConfig,
    pub qlearning: QLearningConfig,
}

impl NavConfig {
    /// Parses a configuration from a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: NavConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a TOML file and validates it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded navigation config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.astar.validate()?;
        self.qlearning.validate()
    }
}

/// Configuration for the A* search engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Upper bound on expansions in `run_to_completion`. `None` runs until
    /// the goal is found or the open set is exhausted.
    pub max_expansions: Option<usize>,
}

impl AStarConfig {
    fn validate(&self) -> Result<()> {
        if self.max_expansions == Some(0) {
            return Err(Error::Config("astar.max_expansions must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration for the Q-learning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate (alpha) before any decay.
    pub initial_learning_rate: f64,
    /// Floor for the decayed learning rate.
    pub min_learning_rate: f64,
    /// Number of training calls over which alpha decays linearly to its floor.
    pub learning_rate_horizon: u32,
    /// Discount factor (gamma) for future rewards.
    pub discount_factor: f64,
    /// Exploration rate (epsilon) before any decay.
    pub exploration_rate: f64,
    /// Floor for the per-step decayed exploration rate.
    pub min_exploration_rate: f64,
    /// Step count over which epsilon decays within one training call.
    pub max_training_iterations: u32,
    /// Training calls over which exploration fades out, and the attempt
    /// budget of an auto-train sequence.
    pub max_training_attempts: u32,
    /// Manhattan radius inside which the agent heads straight for the goal.
    pub goal_homing_radius: i32,
    /// Reward for reaching the goal or a goal-adjacent cell.
    pub goal_reward: f64,
    /// Reward for ending up on a wall cell.
    pub wall_penalty: f64,
    /// Per-unit Manhattan distance penalty for ordinary steps.
    pub distance_penalty: f64,
    /// Penalty spread over the states leading into a dead end.
    pub dead_end_penalty: f64,
    /// How many states (including the dead end) receive the penalty.
    pub dead_end_backtrack: usize,
    /// Iteration cap for [`best_path`](crate::QLearningAgent::best_path).
    pub best_path_cap: usize,
    /// Iteration cap for [`min_steps_path`](crate::QLearningAgent::min_steps_path).
    pub min_steps_cap: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            initial_learning_rate: 0.8,
            min_learning_rate: 0.1,
            learning_rate_horizon: 1000,
            discount_factor: 0.9,
            exploration_rate: 0.2,
            min_exploration_rate: 0.01,
            max_training_iterations: 10_000,
            max_training_attempts: 1000,
            goal_homing_radius: 3,
            goal_reward: 1000.0,
            wall_penalty: -100.0,
            distance_penalty: 0.1,
            dead_end_penalty: -100.0,
            dead_end_backtrack: 3,
            best_path_cap: 1000,
            min_steps_cap: 10_000,
        }
    }
}

impl QLearningConfig {
    /// A configuration that settles quickly, for small grids and tests.
    /// Exploration fades within a few dozen calls.
    pub fn fast_decay() -> Self {
        Self {
            exploration_rate: 0.3,
            max_training_iterations: 200,
            max_training_attempts: 50,
            learning_rate_horizon: 100,
            ..Default::default()
        }
    }

    /// Sets the auto-train attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_training_attempts = attempts;
        self
    }

    /// Sets the discount factor.
    pub fn with_discount(mut self, gamma: f64) -> Self {
        self.discount_factor = gamma;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be in [0, 1], got {}", name, v)))
            }
        };
        unit("initial_learning_rate", self.initial_learning_rate)?;
        unit("min_learning_rate", self.min_learning_rate)?;
        unit("discount_factor", self.discount_factor)?;
        unit("exploration_rate", self.exploration_rate)?;
        unit("min_exploration_rate", self.min_exploration_rate)?;

        if self.learning_rate_horizon == 0
            || self.max_training_iterations == 0
            || self.max_training_attempts == 0
        {
            return Err(Error::Config(
                "learning_rate_horizon, max_training_iterations and max_training_attempts must be positive"
                    .into(),
            ));
        }
        if self.goal_homing_radius < 0 {
            return Err(Error::Config("goal_homing_radius must not be negative".into()));
        }
        if self.best_path_cap == 0 || self.min_steps_cap == 0 {
            return Err(Error::Config("rollout caps must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QLearningConfig::default();
        assert_eq!(config.initial_learning_rate, 0.8);
        assert_eq!(config.discount_factor, 0.9);
        assert_eq!(config.max_training_attempts, 1000);
        assert_eq!(config.goal_homing_radius, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fast_decay_config() {
        let config = QLearningConfig::fast_decay();
        assert!(config.max_training_attempts < QLearningConfig::default().max_training_attempts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = NavConfig::from_toml_str(
            r#"
            [astar]
            max_expansions = 500

            [qlearning]
            discount_factor = 0.95
            max_training_attempts = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.astar.max_expansions, Some(500));
        assert_eq!(config.qlearning.discount_factor, 0.95);
        assert_eq!(config.qlearning.max_training_attempts, 20);
        assert_eq!(config.qlearning.initial_learning_rate, 0.8);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = NavConfig::from_toml_str("").unwrap();
        assert_eq!(config, NavConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = NavConfig::from_toml_str("[qlearning]\nexploration_rate = 1.5\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = NavConfig::from_toml_str("[astar]\nmax_expansions = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let config = QLearningConfig::default().with_max_attempts(0);
        assert!(config.validate().is_err());

        assert!(QLearningConfig::default().with_discount(0.5).validate().is_ok());
        assert!(QLearningConfig::default().with_discount(-0.1).validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nav.toml");
        std::fs::write(&path, "[qlearning]\ngoal_homing_radius = 2\n").unwrap();

        let config = NavConfig::from_file(&path).unwrap();
        assert_eq!(config.qlearning.goal_homing_radius, 2);

        assert!(NavConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = NavConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: NavConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
