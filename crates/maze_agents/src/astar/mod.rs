//! A* search over a [`GridView`](crate::GridView).
//!
//! Costs are Euclidean: `G` accumulates the straight-line length of each
//! move and `H` is the straight-line distance to the goal, which never
//! overestimates on 4- or 8-way grids.
//!
//! ## Example
//!
//! ```rust
//! use maze_agents::{Location, OccupancyGrid, SearchSession};
//!
//! let grid = OccupancyGrid::open(5, 5);
//! let mut session = SearchSession::begin(&grid, Location::new(1, 1), Location::new(3, 3)).unwrap();
//! let path = session.run_to_completion().unwrap();
//!
//! assert_eq!(path.cells.first(), Some(&Location::new(1, 1)));
//! assert_eq!(path.cells.last(), Some(&Location::new(3, 3)));
//! assert_eq!(path.steps(), 4);
//! ```
//!
//! Open-set members that are rediscovered take the new G/H/F and parent
//! unconditionally, not only when the new route is cheaper.

pub mod node;
pub mod session;

pub use node::{ClosedSet, NodeId, OpenSet, SearchNode};
pub use session::{SearchPath, SearchSession, StepResult};
