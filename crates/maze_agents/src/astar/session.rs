//! A* search session.

use super::node::{ClosedSet, NodeId, OpenSet, SearchNode};
use crate::config::AStarConfig;
use crate::error::{Error, Result};
use crate::grid::{random_endpoints, validate_endpoints, GridView};
use crate::random::RandomSource;
use crate::types::Location;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Outcome of a single [`SearchSession::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The goal has not been expanded yet.
    Continue,
    /// The node just expanded is the goal.
    Found,
}

/// A completed A* route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPath {
    /// Cells from start to goal, inclusive.
    pub cells: Vec<Location>,
    /// Sum of Euclidean distances between consecutive cells.
    pub cost: f64,
    /// Number of nodes moved to the closed set during the search.
    pub expansions: usize,
}

impl SearchPath {
    /// Number of moves (cells minus one).
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

/// One A* search between a fixed start and goal.
///
/// The session can be driven one expansion at a time with [`step`](Self::step),
/// letting a host interleave search progress with other work, or run to the
/// end with [`run_to_completion`](Self::run_to_completion).
pub struct SearchSession<'g, G: GridView + ?Sized> {
    grid: &'g G,
    config: AStarConfig,
    start: Location,
    goal: Location,
    /// Node arena; parents are indices into it.
    nodes: Vec<SearchNode>,
    open: OpenSet,
    closed: ClosedSet,
    last: NodeId,
    found: bool,
    expansions: usize,
}

impl<'g, G: GridView + ?Sized> SearchSession<'g, G> {
    /// Starts a search from `start` to `goal` with default configuration.
    pub fn begin(grid: &'g G, start: Location, goal: Location) -> Result<Self> {
        Self::with_config(grid, start, goal, AStarConfig::default())
    }

    /// Starts a search with explicit configuration.
    pub fn with_config(
        grid: &'g G,
        start: Location,
        goal: Location,
        config: AStarConfig,
    ) -> Result<Self> {
        validate_endpoints(grid, start, goal)?;

        let mut session = Self {
            grid,
            config,
            start,
            goal,
            nodes: Vec::new(),
            open: OpenSet::new(),
            closed: ClosedSet::new(),
            last: NodeId(0),
            found: false,
            expansions: 0,
        };
        session.reset();
        debug!("[AStar] begin: start={} goal={}", start, goal);
        Ok(session)
    }

    /// Starts a search between two random free interior cells.
    pub fn begin_random<R: RandomSource + ?Sized>(grid: &'g G, rng: &mut R) -> Result<Self> {
        let (start, goal) = random_endpoints(grid, rng)?;
        Self::begin(grid, start, goal)
    }

    /// Discards all progress and starts over with the same endpoints.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.closed.clear();

        let start_node = SearchNode::new(self.start, 0.0, 0.0, None);
        self.open.insert(&start_node, NodeId(0));
        self.nodes.push(start_node);
        self.last = NodeId(0);
        self.found = false;
        self.expansions = 0;
    }

    /// Expands the most recently closed node and closes the best open one.
    ///
    /// Neighbors already in the open set get their G/H/F and parent
    /// overwritten with the values computed from the current node, even when
    /// the new G is worse.
    pub fn step(&mut self) -> Result<StepResult> {
        if self.found {
            return Ok(StepResult::Found);
        }

        let current_id = self.last;
        let (current_loc, current_g) = {
            let node = &self.nodes[current_id.0];
            (node.location, node.g)
        };

        let grid = self.grid;
        for dir in grid.directions() {
            let neighbor = current_loc + *dir;
            if !grid.is_open(neighbor) || self.closed.contains(&neighbor) {
                continue;
            }

            let g = current_g + current_loc.euclidean(&neighbor);
            let h = neighbor.euclidean(&self.goal);

            match self.open.get(&neighbor) {
                Some(id) => {
                    self.nodes[id.0] = SearchNode::new(neighbor, g, h, Some(current_id));
                    self.open.reprioritize(&self.nodes[id.0]);
                }
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(SearchNode::new(neighbor, g, h, Some(current_id)));
                    self.open.insert(&self.nodes[id.0], id);
                }
            }
        }

        let best = self.open.pop_best(&self.nodes).ok_or(Error::Exhausted {
            expansions: self.expansions,
        })?;
        let best_node = &self.nodes[best.0];
        self.closed.insert(best_node.location);
        self.last = best;
        self.expansions += 1;

        trace!(
            "[AStar] closed {} g={:.2} h={:.2} f={:.2} open={}",
            best_node.location,
            best_node.g,
            best_node.h,
            best_node.f,
            self.open.len()
        );

        if best_node.location == self.goal {
            self.found = true;
            debug!("[AStar] found goal after {} expansions", self.expansions);
            return Ok(StepResult::Found);
        }
        Ok(StepResult::Continue)
    }

    /// Steps until the goal is found and returns the route.
    pub fn run_to_completion(&mut self) -> Result<SearchPath> {
        loop {
            match self.step() {
                Ok(StepResult::Found) => break,
                Ok(StepResult::Continue) => {}
                Err(e) => {
                    debug!("[AStar] FAILED: {}", e);
                    return Err(e);
                }
            }
            if let Some(cap) = self.config.max_expansions {
                if self.expansions >= cap {
                    debug!("[AStar] FAILED: expansion cap {} reached", cap);
                    return Err(Error::IterationCapExceeded(cap));
                }
            }
        }

        let mut cells = self.reconstruct_path();
        cells.reverse();
        let cost: f64 = cells.windows(2).map(|w| w[0].euclidean(&w[1])).sum();

        Ok(SearchPath {
            cells,
            cost,
            expansions: self.expansions,
        })
    }

    /// Walks parent links from the last expanded node back to start.
    ///
    /// The result runs goal → start; reverse it for travel order.
    pub fn reconstruct_path(&self) -> Vec<Location> {
        let mut path = Vec::new();
        let mut cursor = Some(self.last);
        while let Some(id) = cursor {
            let node = &self.nodes[id.0];
            path.push(node.location);
            cursor = node.parent;
        }
        path
    }

    /// Returns the start location.
    pub fn start(&self) -> Location {
        self.start
    }

    /// Returns the goal location.
    pub fn goal(&self) -> Location {
        self.goal
    }

    /// Returns true once the goal has been expanded.
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Returns the number of nodes expanded so far.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Returns the number of nodes waiting in the open set.
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Returns the number of closed locations.
    pub fn closed_len(&self) -> usize {
        self.closed.len()
    }

    /// Returns true if `location` is in the open set.
    pub fn is_open(&self, location: &Location) -> bool {
        self.open.contains(location)
    }

    /// Returns true if `location` has been expanded.
    pub fn is_closed(&self, location: &Location) -> bool {
        self.closed.contains(location)
    }

    /// Current members of the open set, in no particular order.
    pub fn open_nodes(&self) -> impl Iterator<Item = &SearchNode> + '_ {
        self.open.ids().map(move |id| &self.nodes[id.0])
    }

    /// Looks up the open-set node at `location`.
    pub fn open_node(&self, location: &Location) -> Option<&SearchNode> {
        self.open.get(location).map(|id| &self.nodes[id.0])
    }

    /// Returns the expanded locations, in no particular order.
    pub fn closed_locations(&self) -> impl Iterator<Item = &Location> {
        self.closed.iter()
    }

    /// The node that the next [`step`](Self::step) will expand.
    pub fn last_expanded(&self) -> &SearchNode {
        &self.nodes[self.last.0]
    }
}
