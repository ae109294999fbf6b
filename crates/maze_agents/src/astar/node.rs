//! Search nodes and the open/closed sets.

use crate::types::Location;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Index of a [`SearchNode`] in a session's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A node in the A* search tree.
///
/// Equality is by location only, regardless of costs or parent.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub location: Location,
    /// Cost from start.
    pub g: f64,
    /// Heuristic estimate to goal.
    pub h: f64,
    /// `g + h`
    pub f: f64,
    pub parent: Option<NodeId>,
}

impl SearchNode {
    pub fn new(location: Location, g: f64, h: f64, parent: Option<NodeId>) -> Self {
        Self {
            location,
            g,
            h,
            f: g + h,
            parent,
        }
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl Eq for SearchNode {}

/// Heap entry; stale once `version` no longer matches the node's.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    h: f64,
    id: NodeId,
    version: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior: lowest F, then lowest H, then the
        // node that entered the open set first.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Frontier of discovered but unexpanded nodes, keyed by location.
///
/// Updating a member pushes a fresh heap entry and invalidates the old one,
/// so costs may move in either direction.
#[derive(Debug, Default)]
pub struct OpenSet {
    index: HashMap<Location, (NodeId, u32)>,
    heap: BinaryHeap<OpenEntry>,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.index.contains_key(location)
    }

    pub fn get(&self, location: &Location) -> Option<NodeId> {
        self.index.get(location).map(|(id, _)| *id)
    }

    /// Iterates over member ids in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.index.values().map(|(id, _)| *id)
    }

    /// Adds a node that is not yet a member.
    pub(crate) fn insert(&mut self, node: &SearchNode, id: NodeId) {
        debug_assert!(!self.index.contains_key(&node.location));
        self.index.insert(node.location, (id, 0));
        self.heap.push(OpenEntry {
            f: node.f,
            h: node.h,
            id,
            version: 0,
        });
    }

    /// Re-keys a member after its costs changed.
    pub(crate) fn reprioritize(&mut self, node: &SearchNode) {
        if let Some((id, version)) = self.index.get_mut(&node.location) {
            *version += 1;
            self.heap.push(OpenEntry {
                f: node.f,
                h: node.h,
                id: *id,
                version: *version,
            });
        }
    }

    /// Removes and returns the member with the lowest `(F, H)`.
    pub(crate) fn pop_best(&mut self, nodes: &[SearchNode]) -> Option<NodeId> {
        while let Some(entry) = self.heap.pop() {
            let location = nodes[entry.id.0].location;
            match self.index.get(&location) {
                Some((id, version)) if *id == entry.id && *version == entry.version => {
                    self.index.remove(&location);
                    return Some(entry.id);
                }
                _ => continue,
            }
        }
        None
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.heap.clear();
    }
}

/// Locations that have already been expanded.
#[derive(Debug, Default)]
pub struct ClosedSet {
    members: HashSet<Location>,
}

impl ClosedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: Location) -> bool {
        self.members.insert(location)
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.members.contains(location)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.members.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
    }
}
