//! Tabular Q-learning with dead-end backpropagation.
//!
//! The agent learns, per grid cell, a value for every movement direction.
//! Training runs one episode per call; an episode stops when the agent is next
//! to the goal, when it has no unvisited neighbour left (a *dead end*), or
//! when a move brings it back to a visited cell. Dead ends become temporary
//! walls for the rest of the training session and the last few states of the
//! episode are pushed down by a decaying penalty.
//!
//! Action choice, in order:
//! 1. Within `goal_homing_radius` of the goal, move to the unvisited
//!    neighbour closest to it, if that is closer than the current cell.
//! 2. With the decayed exploration probability, a random unvisited neighbour.
//! 3. Otherwise the best-valued unvisited neighbour.
//!
//! ## Example
//!
//! ```rust
//! use maze_agents::{Location, OccupancyGrid, QLearningAgent, QLearningConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let grid = OccupancyGrid::open(6, 1);
//! let mut agent = QLearningAgent::with_rng(grid, QLearningConfig::default(), StdRng::seed_from_u64(1));
//! agent.set_endpoints(Location::new(0, 0), Location::new(5, 0)).unwrap();
//!
//! let report = agent.train_once().unwrap();
//! assert_eq!(report.path[0], Location::new(0, 0));
//! assert_eq!(agent.total_training_count(), 1);
//! ```

mod agent;
mod auto_train;
mod episode;
mod table;

pub use agent::QLearningAgent;
pub use auto_train::{AutoTrain, CancelToken};
pub use episode::{AttemptReport, AutoTrainSummary, EpisodeOutcome, EpisodeReport};
pub use table::{QTable, TIE_EPSILON};
