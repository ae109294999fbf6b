//! The grid abstraction both engines read from.
//!
//! Engines only ever query a [`GridView`]; maze generation lives elsewhere.
//! [`OccupancyGrid`] is a small in-memory implementation used by hosts that
//! already hold an occupancy array and by the tests.

use crate::error::{EndpointFault, Error, Result};
use crate::random::RandomSource;
use crate::types::{directions, Location};
use std::sync::Arc;

/// Read-only view of a 2-D occupancy grid.
pub trait GridView {
    /// Number of columns (valid `x` is `0..width`).
    fn width(&self) -> i32;

    /// Number of rows (valid `z` is `0..depth`).
    fn depth(&self) -> i32;

    /// Returns `true` if the in-bounds cell `(x, z)` is blocked.
    fn is_wall(&self, x: i32, z: i32) -> bool;

    /// Movement offsets. Their order defines action indices.
    fn directions(&self) -> &[Location];

    fn in_bounds(&self, loc: Location) -> bool {
        loc.x >= 0 && loc.x < self.width() && loc.z >= 0 && loc.z < self.depth()
    }

    /// In bounds and not a wall.
    fn is_open(&self, loc: Location) -> bool {
        self.in_bounds(loc) && !self.is_wall(loc.x, loc.z)
    }

    fn cell_count(&self) -> usize {
        (self.width().max(0) as usize) * (self.depth().max(0) as usize)
    }
}

impl<G: GridView + ?Sized> GridView for &G {
    fn width(&self) -> i32 {
        (**self).width()
    }
    fn depth(&self) -> i32 {
        (**self).depth()
    }
    fn is_wall(&self, x: i32, z: i32) -> bool {
        (**self).is_wall(x, z)
    }
    fn directions(&self) -> &[Location] {
        (**self).directions()
    }
}

impl<G: GridView + ?Sized> GridView for Box<G> {
    fn width(&self) -> i32 {
        (**self).width()
    }
    fn depth(&self) -> i32 {
        (**self).depth()
    }
    fn is_wall(&self, x: i32, z: i32) -> bool {
        (**self).is_wall(x, z)
    }
    fn directions(&self) -> &[Location] {
        (**self).directions()
    }
}

impl<G: GridView + ?Sized> GridView for Arc<G> {
    fn width(&self) -> i32 {
        (**self).width()
    }
    fn depth(&self) -> i32 {
        (**self).depth()
    }
    fn is_wall(&self, x: i32, z: i32) -> bool {
        (**self).is_wall(x, z)
    }
    fn directions(&self) -> &[Location] {
        (**self).directions()
    }
}

/// A dense occupancy grid: `true` marks a wall.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    width: i32,
    depth: i32,
    walls: Vec<bool>,
    directions: Vec<Location>,
    scale: f32,
}

impl OccupancyGrid {
    /// A grid with no walls and 4-way movement.
    pub fn open(width: i32, depth: i32) -> Self {
        let width = width.max(0);
        let depth = depth.max(0);
        Self {
            width,
            depth,
            walls: vec![false; (width * depth) as usize],
            directions: directions::FOUR_WAY.to_vec(),
            scale: 1.0,
        }
    }

    /// A grid whose outer ring is wall, like a generated maze's border.
    pub fn bordered(width: i32, depth: i32) -> Self {
        let mut grid = Self::open(width, depth);
        for x in 0..grid.width {
            grid.set_wall(Location::new(x, 0), true);
            grid.set_wall(Location::new(x, grid.depth - 1), true);
        }
        for z in 0..grid.depth {
            grid.set_wall(Location::new(0, z), true);
            grid.set_wall(Location::new(grid.width - 1, z), true);
        }
        grid
    }

    /// Parses a text map, one row per line. `#` is a wall, anything else is
    /// free. The first line is `z = 0`; ragged rows are padded with walls.
    ///
    /// Blank lines are skipped and the indent shared by every row is removed,
    /// so maps can be written inline. Other spaces are free cells.
    pub fn from_ascii(text: &str) -> Self {
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        let indent = lines
            .iter()
            .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);
        let rows: Vec<&str> = lines.iter().map(|line| &line[indent..]).collect();
        let depth = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;

        let mut grid = Self::open(width, depth);
        for (z, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.chars().collect();
            for x in 0..width as usize {
                let wall = chars.get(x).map_or(true, |c| *c == '#');
                grid.set_wall(Location::new(x as i32, z as i32), wall);
            }
        }
        grid
    }

    /// Replaces the movement offsets (e.g. with [`directions::EIGHT_WAY`]).
    pub fn with_directions(mut self, directions: &[Location]) -> Self {
        self.directions = directions.to_vec();
        self
    }

    /// Sets the world-space size of one cell.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Marks or clears a wall. Out-of-bounds locations are ignored.
    pub fn set_wall(&mut self, loc: Location, wall: bool) {
        if let Some(idx) = self.index(loc) {
            self.walls[idx] = wall;
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// World-space `(x, z)` of a cell's origin.
    pub fn world_position(&self, loc: Location) -> (f32, f32) {
        (loc.x as f32 * self.scale, loc.z as f32 * self.scale)
    }

    fn index(&self, loc: Location) -> Option<usize> {
        if self.in_bounds(loc) {
            Some((loc.z * self.width + loc.x) as usize)
        } else {
            None
        }
    }
}

impl GridView for OccupancyGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn is_wall(&self, x: i32, z: i32) -> bool {
        self.index(Location::new(x, z))
            .map_or(true, |idx| self.walls[idx])
    }

    fn directions(&self) -> &[Location] {
        &self.directions
    }
}

/// Checks that `start` and `goal` are free, in bounds and distinct.
pub fn validate_endpoints<G: GridView + ?Sized>(
    grid: &G,
    start: Location,
    goal: Location,
) -> Result<()> {
    for location in [start, goal] {
        if !grid.in_bounds(location) {
            return Err(Error::InvalidEndpoint {
                location,
                fault: EndpointFault::OutOfBounds,
            });
        }
        if grid.is_wall(location.x, location.z) {
            return Err(Error::InvalidEndpoint {
                location,
                fault: EndpointFault::Wall,
            });
        }
    }
    if start == goal {
        return Err(Error::InvalidEndpoint {
            location: goal,
            fault: EndpointFault::Coincident,
        });
    }
    Ok(())
}

/// Picks two distinct free cells from the grid interior (the outer ring is
/// excluded), returning `(start, goal)`.
pub fn random_endpoints<G, R>(grid: &G, rng: &mut R) -> Result<(Location, Location)>
where
    G: GridView + ?Sized,
    R: RandomSource + ?Sized,
{
    let mut free: Vec<Location> = (1..grid.depth() - 1)
        .flat_map(|z| (1..grid.width() - 1).map(move |x| Location::new(x, z)))
        .filter(|loc| !grid.is_wall(loc.x, loc.z))
        .collect();

    if free.len() < 2 {
        return Err(Error::InsufficientFreeCells(free.len()));
    }

    let start = free.swap_remove(rng.below(free.len()));
    let goal = free.swap_remove(rng.below(free.len()));
    log::debug!("Picked endpoints start={} goal={}", start, goal);
    Ok((start, goal))
}
