//! # Maze Agents - grid navigation by search and by learning
//!
//! Two ways of getting from a start cell to a goal cell of a 2-D occupancy
//! grid:
//! - **A\*** search with a Euclidean heuristic, driven one expansion at a time
//!   or run to completion.
//! - A **Q-learning** agent that learns a per-cell action table, marks dead
//!   ends as temporary walls and pushes their approach down with a decaying
//!   penalty.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                       GridView                         │
//! │        (width, depth, is_wall, directions)             │
//! └─────────────┬──────────────────────────┬───────────────┘
//!               │                          │
//!        ┌──────▼───────┐          ┌───────▼────────┐
//!        │ SearchSession│          │ QLearningAgent │
//!        │              │          │                │
//!        │ OpenSet      │          │ QTable         │
//!        │ ClosedSet    │          │ dead ends      │
//!        │ node arena   │          │ AutoTrain ─────┼──► CancelToken
//!        └──────┬───────┘          └───────┬────────┘
//!               │                          │
//!               │                  ┌───────▼────────┐
//!               │                  │  QTableStore   │
//!               │                  │ memory / JSON  │
//!               │                  └────────────────┘
//!        ┌──────▼──────────────────────────▼───────┐
//!        │                Comparator               │
//!        └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ### A* search
//!
//! ```rust
//! use maze_agents::{Location, OccupancyGrid, SearchSession, StepResult};
//!
//! let grid = OccupancyGrid::from_ascii(
//!     "
//!     .....
//!     .###.
//!     .....
//!     ",
//! );
//! let mut session = SearchSession::begin(&grid, Location::new(0, 0), Location::new(4, 2)).unwrap();
//!
//! // Step manually, e.g. once per frame...
//! while session.step().unwrap() == StepResult::Continue {}
//!
//! // ...then walk the parent links.
//! let mut route = session.reconstruct_path();
//! route.reverse();
//! assert_eq!(route.len(), 7);
//! ```
//!
//! ### Q-learning
//!
//! ```rust,no_run
//! use maze_agents::{create_agent, OccupancyGrid};
//!
//! let mut agent = create_agent(OccupancyGrid::bordered(12, 12));
//! agent.randomize_endpoints().unwrap();
//!
//! let summary = agent.start_auto_train().unwrap().finish();
//! if summary.success {
//!     println!("learned route: {:?}", agent.best_path());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`astar`]: search session, open and closed sets
//! - [`qlearning`]: agent, table, auto-training
//! - [`persistence`]: table stores
//! - [`compare`]: timed side-by-side runs
//! - [`config`]: TOML-loadable settings
//! - [`grid`]: the grid view trait and an in-memory grid

pub mod astar;
pub mod compare;
pub mod config;
pub mod error;
pub mod grid;
pub mod persistence;
pub mod qlearning;
pub mod random;
pub mod types;

pub use astar::{SearchNode, SearchPath, SearchSession, StepResult};
pub use compare::{AStarRun, Comparator, ComparisonReport, QLearningRun};
pub use config::{AStarConfig, NavConfig, QLearningConfig};
pub use error::{EndpointFault, Error, Result};
pub use grid::{random_endpoints, validate_endpoints, GridView, OccupancyGrid};
pub use persistence::{
    JsonFileStore, MemoryStore, PersistenceError, PersistenceOptions, QTableSnapshot,
    QTableStore, StateEntry,
};
pub use qlearning::{
    AttemptReport, AutoTrain, AutoTrainSummary, CancelToken, EpisodeOutcome, EpisodeReport,
    QLearningAgent, QTable,
};
pub use random::RandomSource;
pub use types::{directions, Location};

/// Maze Agents version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a Q-learning agent with default configuration.
///
/// The agent keeps its table in memory and draws randomness from a freshly
/// seeded [`rand::rngs::StdRng`].
///
/// # Examples
///
/// ```
/// use maze_agents::{create_agent, OccupancyGrid};
///
/// let agent = create_agent(OccupancyGrid::bordered(6, 6));
/// assert!(agent.table().is_empty());
/// assert_eq!(agent.start(), None);
/// ```
pub fn create_agent<G: GridView>(grid: G) -> QLearningAgent<G> {
    QLearningAgent::new(grid, QLearningConfig::default())
}

/// Runs A* from `start` to `goal` and returns the route.
///
/// # Examples
///
/// ```
/// use maze_agents::{shortest_path, Location, OccupancyGrid};
///
/// let grid = OccupancyGrid::open(5, 5);
/// let path = shortest_path(&grid, Location::new(1, 1), Location::new(3, 3)).unwrap();
/// assert_eq!(path.cost, 4.0);
/// ```
pub fn shortest_path<G: GridView + ?Sized>(
    grid: &G,
    start: Location,
    goal: Location,
) -> Result<SearchPath> {
    SearchSession::begin(grid, start, goal)?.run_to_completion()
}
