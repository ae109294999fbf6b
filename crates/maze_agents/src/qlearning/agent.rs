//! The Q-learning agent.

use super::auto_train::AutoTrain;
use super::episode::{EpisodeOutcome, EpisodeReport};
use super::table::{QTable, TIE_EPSILON};
use crate::config::QLearningConfig;
use crate::error::{Error, Result};
use crate::grid::{random_endpoints, validate_endpoints, GridView};
use crate::persistence::{MemoryStore, QTableStore};
use crate::random::{pick, RandomSource};
use crate::types::Location;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// A tabular Q-learning agent that learns to walk from a start cell to a
/// goal cell of a [`GridView`].
///
/// States are grid locations and actions are indices into the grid's
/// direction list. Each [`train_once`](Self::train_once) runs one episode
/// that ends when the agent stands next to the goal, runs into a dead end,
/// or steps back onto a visited cell. Dead ends are remembered for the rest
/// of the training session and the states leading into them are penalised.
pub struct QLearningAgent<G, R = StdRng> {
    grid: G,
    config: QLearningConfig,
    rng: R,
    store: Box<dyn QTableStore + Send>,
    table: QTable,
    /// Cells proven to be dead ends during the current training session.
    dead_ends: HashSet<Location>,
    /// Cells visited by the current episode.
    visited: HashSet<Location>,
    last_path: Vec<Location>,
    endpoints: Option<(Location, Location)>,
    total_training_count: u32,
    iteration_count: u32,
    pub(crate) training: bool,
}

impl<G: GridView> QLearningAgent<G, StdRng> {
    /// Creates an agent seeded from the thread-local generator.
    pub fn new(grid: G, config: QLearningConfig) -> Self {
        let rng = StdRng::from_rng(&mut rand::rng());
        Self::with_rng(grid, config, rng)
    }
}

impl<G: GridView, R: RandomSource> QLearningAgent<G, R> {
    /// Creates an agent drawing randomness from `rng`.
    pub fn with_rng(grid: G, config: QLearningConfig, rng: R) -> Self {
        let actions = grid.directions().len();
        Self {
            grid,
            config,
            rng,
            store: Box::new(MemoryStore::new()),
            table: QTable::new(actions),
            dead_ends: HashSet::new(),
            visited: HashSet::new(),
            last_path: Vec::new(),
            endpoints: None,
            total_training_count: 0,
            iteration_count: 0,
            training: false,
        }
    }

    /// Replaces the table store and loads whatever it holds.
    ///
    /// A store that fails to load, or holds rows of the wrong width, leaves
    /// the agent with an empty table.
    pub fn with_store(mut self, store: Box<dyn QTableStore + Send>) -> Self {
        self.store = store;
        match self.store.load() {
            Ok(Some(snapshot)) => match self.table.restore(&snapshot) {
                Ok(()) => info!("Restored Q-table with {} states", self.table.len()),
                Err(e) => {
                    warn!("Ignoring stored Q-table: {}", e);
                    self.table.clear();
                }
            },
            Ok(None) => debug!("No stored Q-table, starting empty"),
            Err(e) => warn!("Failed to load Q-table: {}", e),
        }
        self
    }

    // ---- endpoints ----

    /// Sets start and goal and forgets dead ends.
    pub fn set_endpoints(&mut self, start: Location, goal: Location) -> Result<()> {
        validate_endpoints(&self.grid, start, goal)?;
        self.endpoints = Some((start, goal));
        self.dead_ends.clear();
        self.last_path.clear();
        debug!("Endpoints set: start={} goal={}", start, goal);
        Ok(())
    }

    /// Picks random start and goal cells and forgets dead ends.
    pub fn randomize_endpoints(&mut self) -> Result<(Location, Location)> {
        let (start, goal) = random_endpoints(&self.grid, &mut self.rng)?;
        self.endpoints = Some((start, goal));
        self.dead_ends.clear();
        self.last_path.clear();
        Ok((start, goal))
    }

    pub(crate) fn endpoints(&self) -> Result<(Location, Location)> {
        self.endpoints.ok_or(Error::EndpointsUnset)
    }

    // ---- training ----

    /// Runs one training episode from start, after forgetting dead ends.
    ///
    /// The table is saved to the store afterwards whatever the outcome.
    pub fn train_once(&mut self) -> Result<EpisodeReport> {
        self.endpoints()?;
        self.dead_ends.clear();
        self.train_round()
    }

    /// Starts an auto-train sequence.
    ///
    /// The returned iterator runs one training round per `next()` followed by
    /// a greedy verification rollout, and stops after the first verified
    /// success or after `max_training_attempts` rounds.
    pub fn start_auto_train(&mut self) -> Result<AutoTrain<'_, G, R>> {
        self.endpoints()?;
        self.dead_ends.clear();
        Ok(AutoTrain::new(self))
    }

    /// One episode plus save, keeping dead ends found so far.
    pub(crate) fn train_round(&mut self) -> Result<EpisodeReport> {
        self.total_training_count += 1;
        self.iteration_count = 0;
        let report = self.run_episode()?;
        self.persist();
        Ok(report)
    }

    fn run_episode(&mut self) -> Result<EpisodeReport> {
        let (start, goal) = self.endpoints()?;
        let alpha = self.current_learning_rate();
        let gamma = self.config.discount_factor;

        self.visited.clear();
        self.visited.insert(start);
        let mut path = vec![start];
        let mut state = start;
        let mut steps = 0;

        let outcome = loop {
            self.iteration_count += 1;

            if state.is_adjacent(&goal) {
                path.push(goal);
                break EpisodeOutcome::GoalReached;
            }

            if !self.has_safe_neighbor(state) {
                self.mark_dead_end(state, &path);
                break EpisodeOutcome::DeadEnd(state);
            }

            let action = self.choose_action(state, goal);
            let next = self.next_state(state, action, goal);
            let reward = self.reward(next, goal);

            self.table.row_mut(state);
            let max_next = self.table.max_value_or_insert(next);
            let q = self
                .table
                .update(state, action, reward + gamma * max_next, alpha);
            steps += 1;
            trace!(
                "[QL] {} -a{}-> {} r={:.2} q={:.3}",
                state,
                action,
                next,
                reward,
                q
            );

            if self.visited.contains(&next) {
                break EpisodeOutcome::Trapped(next);
            }
            self.visited.insert(next);
            path.push(next);
            state = next;
        };

        debug!(
            "Episode {} ended {:?} after {} iterations (path {} cells)",
            self.total_training_count,
            outcome,
            self.iteration_count,
            path.len()
        );

        self.last_path = path.clone();
        Ok(EpisodeReport {
            outcome,
            steps,
            iterations: self.iteration_count,
            path,
            learning_rate: alpha,
        })
    }

    /// Records `state` as a dead end and pushes the last few path entries
    /// down, the dead end hardest.
    fn mark_dead_end(&mut self, state: Location, path: &[Location]) {
        self.dead_ends.insert(state);

        let backtrack = self.config.dead_end_backtrack.min(path.len());
        for k in 1..=backtrack {
            let location = path[path.len() - k];
            self.table
                .shift_row(location, self.config.dead_end_penalty / k as f64);
        }
        debug!(
            "Dead end at {}; penalised {} states ({} dead ends known)",
            state,
            backtrack,
            self.dead_ends.len()
        );
    }

    fn persist(&mut self) {
        let snapshot = self.table.snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            warn!("Failed to save Q-table: {}", e);
        }
    }

    // ---- policy ----

    /// In bounds, free, not visited this episode and not a known dead end.
    fn is_safe(&self, location: Location) -> bool {
        self.grid.is_open(location)
            && !self.visited.contains(&location)
            && !self.dead_ends.contains(&location)
    }

    /// A known dead end that has not been visited this episode.
    fn is_fallback(&self, location: Location) -> bool {
        self.dead_ends.contains(&location) && !self.visited.contains(&location)
    }

    fn has_safe_neighbor(&self, state: Location) -> bool {
        self.grid
            .directions()
            .iter()
            .any(|dir| self.is_safe(state + *dir))
    }

    fn actions_where(&self, state: Location, keep: impl Fn(&Self, Location) -> bool) -> Vec<usize> {
        self.grid
            .directions()
            .iter()
            .enumerate()
            .filter(|(_, dir)| keep(self, state + **dir))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Chooses an action index for `state`.
    fn choose_action(&mut self, state: Location, goal: Location) -> usize {
        let distance = state.manhattan(&goal);
        if distance <= self.config.goal_homing_radius {
            let mut closest: Option<(usize, i32)> = None;
            for (idx, dir) in self.grid.directions().iter().enumerate() {
                let neighbor = state + *dir;
                if !self.is_safe(neighbor) {
                    continue;
                }
                let d = neighbor.manhattan(&goal);
                if closest.map_or(true, |(_, best)| d < best) {
                    closest = Some((idx, d));
                }
            }
            if let Some((idx, d)) = closest {
                if d < distance {
                    return idx;
                }
            }
        }

        let safe = self.actions_where(state, Self::is_safe);
        let fallback = self.actions_where(state, Self::is_fallback);

        if self.rng.unit() < self.current_exploration_rate() {
            return self.random_action(&safe, &fallback);
        }

        if !self.table.contains(&state) {
            return self.random_action(&[], &[]);
        }
        if safe.is_empty() {
            return self.random_action(&[], &fallback);
        }

        let ties: Vec<usize> = match self.table.row(&state) {
            Some(row) => {
                let best = safe
                    .iter()
                    .map(|&idx| row[idx])
                    .fold(f64::NEG_INFINITY, f64::max);
                safe.iter()
                    .copied()
                    .filter(|&idx| (row[idx] - best).abs() < TIE_EPSILON)
                    .collect()
            }
            None => Vec::new(),
        };
        pick(&mut self.rng, &ties).unwrap_or(safe[0])
    }

    /// Uniform among `preferred`, else among `fallback`, else any direction.
    fn random_action(&mut self, preferred: &[usize], fallback: &[usize]) -> usize {
        let directions = self.grid.directions().len();
        pick(&mut self.rng, preferred)
            .or_else(|| pick(&mut self.rng, fallback))
            .unwrap_or_else(|| self.rng.below(directions))
    }

    /// Where `action` leads from `state`.
    ///
    /// The goal is always enterable. Moves off the grid, into walls or into
    /// known dead ends leave the agent where it is.
    fn next_state(&self, state: Location, action: usize, goal: Location) -> Location {
        let next = state + self.grid.directions()[action];
        if next == goal {
            return next;
        }
        if !self.grid.is_open(next) || self.dead_ends.contains(&next) {
            return state;
        }
        next
    }

    fn reward(&self, location: Location, goal: Location) -> f64 {
        if location == goal || location.is_adjacent(&goal) {
            return self.config.goal_reward;
        }
        if self.grid.is_wall(location.x, location.z) {
            return self.config.wall_penalty;
        }
        -self.config.distance_penalty * f64::from(location.manhattan(&goal))
    }

    // ---- queries ----

    /// Follows the first maximal action from start until the goal (or a cell
    /// next to it) is reached.
    pub(crate) fn greedy_rollout(&self, cap: usize, halt_on_loop: bool) -> Result<Vec<Location>> {
        let (start, goal) = self.endpoints()?;
        let mut state = start;
        let mut path = vec![start];
        let mut steps = 0;

        loop {
            if state == goal {
                return Ok(path);
            }
            if state.is_adjacent(&goal) {
                path.push(goal);
                return Ok(path);
            }
            if steps >= cap {
                return Err(Error::IterationCapExceeded(cap));
            }

            let action = self
                .table
                .argmax(&state)
                .ok_or(Error::MissingTableEntry(state))?;
            let next = self.next_state(state, action, goal);
            if halt_on_loop && next == state {
                return Err(Error::TrappedLoop(state));
            }
            path.push(next);
            state = next;
            steps += 1;
        }
    }

    /// The greedy route from start to goal under the learned table.
    pub fn best_path(&self) -> Result<Vec<Location>> {
        self.greedy_rollout(self.config.best_path_cap, true)
            .inspect_err(|e| warn!("Best path unavailable: {}", e))
    }

    /// The greedy route without loop detection, bounded by a larger cap.
    ///
    /// Fails immediately if start has never been trained.
    pub fn min_steps_path(&self) -> Result<Vec<Location>> {
        let (start, _) = self.endpoints()?;
        if !self.table.contains(&start) {
            warn!("No table entry for start {}", start);
            return Err(Error::MissingTableEntry(start));
        }
        self.greedy_rollout(self.config.min_steps_cap, false)
            .inspect_err(|e| warn!("Minimum-step path unavailable: {}", e))
    }

    /// Forgets everything learned, including the stored copy.
    pub fn reset_table(&mut self) -> Result<()> {
        self.table.clear();
        self.store.clear()?;
        info!("Q-table reset");
        Ok(())
    }

    /// Forgets dead ends found so far.
    pub fn clear_dead_ends(&mut self) {
        self.dead_ends.clear();
    }

    // ---- accessors ----

    /// Returns the start location, if endpoints are set.
    pub fn start(&self) -> Option<Location> {
        self.endpoints.map(|(start, _)| start)
    }

    /// Returns the goal location, if endpoints are set.
    pub fn goal(&self) -> Option<Location> {
        self.endpoints.map(|(_, goal)| goal)
    }

    /// Returns the grid the agent trains on.
    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// Returns the learning configuration.
    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    /// Returns the Q-table.
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Returns the store the table is saved to.
    pub fn store(&self) -> &dyn QTableStore {
        self.store.as_ref()
    }

    /// Returns the dead ends known for the current endpoints.
    pub fn dead_ends(&self) -> &HashSet<Location> {
        &self.dead_ends
    }

    /// Path of the most recent episode.
    pub fn last_episode_path(&self) -> &[Location] {
        &self.last_path
    }

    /// Training rounds run since construction.
    pub fn total_training_count(&self) -> u32 {
        self.total_training_count
    }

    /// Iterations of the current or most recent episode.
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// `true` while an [`AutoTrain`] sequence holds the agent.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Alpha, decaying linearly with the number of training rounds.
    pub fn current_learning_rate(&self) -> f64 {
        let c = &self.config;
        let progress = f64::from(self.total_training_count) / f64::from(c.learning_rate_horizon);
        (c.initial_learning_rate * (1.0 - progress)).max(c.min_learning_rate)
    }

    /// Epsilon for the current iteration.
    ///
    /// Decays within an episode towards its floor and fades to zero over
    /// `max_training_attempts` rounds.
    pub fn current_exploration_rate(&self) -> f64 {
        let c = &self.config;
        let within = f64::from(self.iteration_count) / f64::from(c.max_training_iterations);
        let across = f64::from(self.total_training_count) / f64::from(c.max_training_attempts);
        let per_step = (c.exploration_rate * (1.0 - within)).max(c.min_exploration_rate);
        (per_step * (1.0 - across)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;
    use crate::types::directions;

    fn agent(grid: OccupancyGrid) -> QLearningAgent<OccupancyGrid> {
        QLearningAgent::with_rng(grid, QLearningConfig::default(), StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_requires_endpoints() {
        let mut agent = agent(OccupancyGrid::bordered(5, 5));
        assert!(matches!(agent.train_once(), Err(Error::EndpointsUnset)));
        assert!(matches!(agent.best_path(), Err(Error::EndpointsUnset)));
        assert!(agent.start_auto_train().is_err());
    }

    #[test]
    fn test_learning_rate_decay() {
        let mut agent = agent(OccupancyGrid::open(4, 4));
        assert_eq!(agent.current_learning_rate(), 0.8);
        agent.total_training_count = 500;
        assert!((agent.current_learning_rate() - 0.4).abs() < 1e-12);
        agent.total_training_count = 990;
        assert_eq!(agent.current_learning_rate(), 0.1);
    }

    #[test]
    fn test_exploration_rate_decay() {
        let mut agent = agent(OccupancyGrid::open(4, 4));
        assert!((agent.current_exploration_rate() - 0.2).abs() < 1e-12);

        agent.iteration_count = 10_000;
        assert!((agent.current_exploration_rate() - 0.01).abs() < 1e-12);

        agent.iteration_count = 0;
        agent.total_training_count = 1000;
        assert_eq!(agent.current_exploration_rate(), 0.0);
        agent.total_training_count = 5000;
        assert_eq!(agent.current_exploration_rate(), 0.0);
    }

    #[test]
    fn test_next_state_transitions() {
        let grid = OccupancyGrid::from_ascii(
            "
            #####
            #...#
            #.#.#
            #####
            ",
        );
        let mut agent = agent(grid);
        let goal = Location::new(3, 2);
        agent.set_endpoints(Location::new(1, 1), goal).unwrap();

        let s = Location::new(1, 1);
        // East into free cell.
        assert_eq!(agent.next_state(s, 0, goal), Location::new(2, 1));
        // West into the border wall.
        assert_eq!(agent.next_state(s, 2, goal), s);
        // The goal is always enterable.
        assert_eq!(agent.next_state(Location::new(3, 1), 1, goal), goal);

        agent.dead_ends.insert(Location::new(2, 1));
        assert_eq!(agent.next_state(s, 0, goal), s);
    }

    #[test]
    fn test_reward() {
        let mut agent = agent(OccupancyGrid::bordered(7, 7));
        let goal = Location::new(5, 5);
        agent.set_endpoints(Location::new(1, 1), goal).unwrap();

        assert_eq!(agent.reward(goal, goal), 1000.0);
        assert_eq!(agent.reward(Location::new(5, 4), goal), 1000.0);
        assert_eq!(agent.reward(Location::new(0, 0), goal), -100.0);
        assert!((agent.reward(Location::new(1, 1), goal) - (-0.8)).abs() < 1e-12);
    }

    #[test]
    fn test_goal_homing_picks_closest_neighbor() {
        let mut agent = agent(OccupancyGrid::open(6, 6));
        let goal = Location::new(4, 1);
        agent.set_endpoints(Location::new(1, 1), goal).unwrap();
        agent.visited.insert(Location::new(1, 1));

        // Distance 3: east (index 0) is the only strictly closer move.
        for _ in 0..20 {
            assert_eq!(agent.choose_action(Location::new(1, 1), goal), 0);
        }
    }

    /// An agent that never explores, so `choose_action` is homing or exploit.
    fn greedy_agent(grid: OccupancyGrid) -> QLearningAgent<OccupancyGrid> {
        let mut config = QLearningConfig::default();
        config.exploration_rate = 0.0;
        config.min_exploration_rate = 0.0;
        QLearningAgent::with_rng(grid, config, StdRng::seed_from_u64(17))
    }

    #[test]
    fn test_goal_homing_skips_dead_end() {
        let mut agent = greedy_agent(OccupancyGrid::open(9, 9));
        let state = Location::new(2, 2);
        let goal = Location::new(4, 2);
        agent.set_endpoints(state, goal).unwrap();
        agent.visited.insert(state);
        agent.dead_ends.insert(Location::new(3, 2));
        agent
            .table
            .row_mut(state)
            .copy_from_slice(&[0.0, 5.0, 1.0, 2.0]);

        // East is the only closer cell but a known dead end, so the table decides.
        for _ in 0..20 {
            assert_eq!(agent.choose_action(state, goal), 1);
        }
    }

    #[test]
    fn test_goal_homing_skips_visited() {
        let mut agent = greedy_agent(OccupancyGrid::open(9, 9));
        let state = Location::new(2, 2);
        let goal = Location::new(4, 2);
        agent.set_endpoints(state, goal).unwrap();
        agent.visited.insert(state);
        agent.visited.insert(Location::new(3, 2));
        agent
            .table
            .row_mut(state)
            .copy_from_slice(&[0.0, 5.0, 1.0, 2.0]);

        for _ in 0..20 {
            assert_eq!(agent.choose_action(state, goal), 1);
        }
    }

    #[test]
    fn test_goal_homing_needs_strictly_closer_cell() {
        let mut grid = OccupancyGrid::open(9, 9).with_directions(&directions::EIGHT_WAY);
        grid.set_wall(Location::new(3, 2), true);
        let mut agent = greedy_agent(grid);
        let state = Location::new(2, 2);
        let goal = Location::new(4, 2);
        agent.set_endpoints(state, goal).unwrap();
        agent.visited.insert(state);
        agent
            .table
            .row_mut(state)
            .copy_from_slice(&[0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        // The diagonals towards the goal only tie the current distance of 2,
        // so no move is forced and the best value (west) wins.
        for _ in 0..20 {
            assert_eq!(agent.choose_action(state, goal), 2);
        }
    }

    #[test]
    fn test_exploit_prefers_highest_safe_value() {
        let mut config = QLearningConfig::default();
        config.exploration_rate = 0.0;
        config.min_exploration_rate = 0.0;
        config.goal_homing_radius = 0;
        let mut agent =
            QLearningAgent::with_rng(OccupancyGrid::open(9, 9), config, StdRng::seed_from_u64(5));
        let goal = Location::new(8, 8);
        let state = Location::new(2, 2);
        agent.set_endpoints(state, goal).unwrap();
        agent.visited.insert(state);

        agent
            .table
            .row_mut(state)
            .copy_from_slice(&[1.0, 5.0, 2.0, -3.0]);
        assert_eq!(agent.choose_action(state, goal), 1);

        // A visited neighbour is skipped even if it has the best value.
        agent.visited.insert(Location::new(2, 3));
        assert_eq!(agent.choose_action(state, goal), 2);
    }

    #[test]
    fn test_dead_end_penalty_spreads_backwards() {
        let mut agent = agent(OccupancyGrid::open(6, 1));
        agent
            .set_endpoints(Location::new(0, 0), Location::new(5, 0))
            .unwrap();

        let path = [
            Location::new(0, 0),
            Location::new(1, 0),
            Location::new(2, 0),
            Location::new(3, 0),
        ];
        agent.mark_dead_end(Location::new(3, 0), &path);

        assert!(agent.dead_ends.contains(&Location::new(3, 0)));
        assert_eq!(agent.table.row(&Location::new(3, 0)), Some(&[-100.0; 4][..]));
        assert_eq!(agent.table.row(&Location::new(2, 0)), Some(&[-50.0; 4][..]));
        let third = agent.table.value(&Location::new(1, 0), 0).unwrap();
        assert!((third - (-100.0 / 3.0)).abs() < 1e-9);
        assert!(agent.table.row(&Location::new(0, 0)).is_none());
    }

    #[test]
    fn test_dead_end_penalty_with_short_path() {
        let mut agent = agent(OccupancyGrid::open(3, 1));
        agent
            .set_endpoints(Location::new(0, 0), Location::new(2, 0))
            .unwrap();
        agent.mark_dead_end(Location::new(0, 0), &[Location::new(0, 0)]);
        assert_eq!(agent.table.len(), 1);
    }

    #[test]
    fn test_greedy_rollout_errors() {
        let mut agent = agent(OccupancyGrid::open(6, 1));
        let start = Location::new(0, 0);
        agent.set_endpoints(start, Location::new(5, 0)).unwrap();

        assert!(matches!(agent.best_path(), Err(Error::MissingTableEntry(s)) if s == start));
        assert!(matches!(agent.min_steps_path(), Err(Error::MissingTableEntry(s)) if s == start));

        // West off the grid is a self-transition.
        agent.table.row_mut(start).copy_from_slice(&[0.0, 0.0, 1.0, 0.0]);
        assert!(matches!(agent.best_path(), Err(Error::TrappedLoop(s)) if s == start));
        assert!(matches!(
            agent.min_steps_path(),
            Err(Error::IterationCapExceeded(10_000))
        ));
    }

    #[test]
    fn test_greedy_rollout_follows_table() {
        let mut agent = agent(OccupancyGrid::open(6, 1));
        agent
            .set_endpoints(Location::new(0, 0), Location::new(5, 0))
            .unwrap();
        for x in 0..4 {
            agent
                .table
                .row_mut(Location::new(x, 0))
                .copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        }

        let path = agent.best_path().unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&Location::new(5, 0)));
        assert_eq!(agent.min_steps_path().unwrap(), path);
    }
}
