//! The tabular action-value store.

use crate::persistence::{PersistenceError, QTableSnapshot, StateEntry};
use crate::types::Location;
use std::collections::HashMap;

/// Values closer than this are treated as equal when breaking ties.
pub const TIE_EPSILON: f64 = 1e-9;

/// Action values per visited state, one entry per movement direction.
///
/// Rows are created lazily and zero-initialised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    rows: HashMap<Location, Vec<f64>>,
    actions: usize,
}

impl QTable {
    /// Creates an empty table with `actions` values per row.
    pub fn new(actions: usize) -> Self {
        Self {
            rows: HashMap::new(),
            actions,
        }
    }

    /// Number of actions per row.
    pub fn actions(&self) -> usize {
        self.actions
    }

    /// Number of states with a row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if `state` has a row.
    pub fn contains(&self, state: &Location) -> bool {
        self.rows.contains_key(state)
    }

    /// Returns the action values for `state`, if it has a row.
    pub fn row(&self, state: &Location) -> Option<&[f64]> {
        self.rows.get(state).map(Vec::as_slice)
    }

    /// Returns the row for `state`, creating a zeroed one if absent.
    pub fn row_mut(&mut self, state: Location) -> &mut Vec<f64> {
        let actions = self.actions;
        self.rows.entry(state).or_insert_with(|| vec![0.0; actions])
    }

    /// Value of `action` in `state`, or `None` without a row.
    pub fn value(&self, state: &Location, action: usize) -> Option<f64> {
        self.rows.get(state).and_then(|row| row.get(action).copied())
    }

    /// Largest value in the row of `state`, creating the row if absent.
    pub fn max_value_or_insert(&mut self, state: Location) -> f64 {
        self.row_mut(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the first maximal value in the row of `state`.
    pub fn argmax(&self, state: &Location) -> Option<usize> {
        let row = self.rows.get(state)?;
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in row.iter().enumerate() {
            match best {
                Some((_, b)) if *value <= b => {}
                _ => best = Some((idx, *value)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Applies `Q[s][a] += alpha * (target - Q[s][a])` and returns the new value.
    pub fn update(&mut self, state: Location, action: usize, target: f64, alpha: f64) -> f64 {
        let row = self.row_mut(state);
        let q = &mut row[action];
        *q += alpha * (target - *q);
        *q
    }

    /// Adds `delta` to every action value of `state`, creating the row if needed.
    pub fn shift_row(&mut self, state: Location, delta: f64) {
        for value in self.row_mut(state).iter_mut() {
            *value += delta;
        }
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Iterates rows in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Location, &[f64])> {
        self.rows.iter().map(|(loc, row)| (loc, row.as_slice()))
    }

    /// Flattens the table, sorted by location for stable output.
    pub fn snapshot(&self) -> QTableSnapshot {
        let mut states: Vec<StateEntry> = self
            .rows
            .iter()
            .map(|(location, values)| StateEntry {
                location: *location,
                values: values.clone(),
            })
            .collect();
        states.sort_by_key(|entry| entry.location);
        QTableSnapshot { states }
    }

    /// Replaces the contents with `snapshot`.
    ///
    /// Fails without modifying the table if any row has the wrong width.
    pub fn restore(&mut self, snapshot: &QTableSnapshot) -> Result<(), PersistenceError> {
        snapshot.check_width(self.actions)?;
        self.rows = snapshot
            .states
            .iter()
            .map(|entry| (entry.location, entry.values.clone()))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_lazy_and_zeroed() {
        let mut table = QTable::new(4);
        let s = Location::new(1, 1);
        assert!(table.row(&s).is_none());
        assert_eq!(table.value(&s, 0), None);

        assert_eq!(table.max_value_or_insert(s), 0.0);
        assert_eq!(table.row(&s), Some(&[0.0; 4][..]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_update_rule() {
        let mut table = QTable::new(4);
        let s = Location::new(2, 2);
        let v = table.update(s, 1, 10.0, 0.5);
        assert_eq!(v, 5.0);
        let v = table.update(s, 1, 10.0, 0.5);
        assert_eq!(v, 7.5);
        assert_eq!(table.value(&s, 0), Some(0.0));
    }

    #[test]
    fn test_argmax_first_on_ties() {
        let mut table = QTable::new(4);
        let s = Location::new(0, 0);
        assert_eq!(table.argmax(&s), None);

        table.row_mut(s).copy_from_slice(&[1.0, 3.0, 3.0, -2.0]);
        assert_eq!(table.argmax(&s), Some(1));

        table.row_mut(s).copy_from_slice(&[0.0; 4]);
        assert_eq!(table.argmax(&s), Some(0));
    }

    #[test]
    fn test_shift_row() {
        let mut table = QTable::new(4);
        let s = Location::new(3, 1);
        table.update(s, 2, 4.0, 1.0);
        table.shift_row(s, -50.0);
        assert_eq!(table.row(&s), Some(&[-50.0, -50.0, -46.0, -50.0][..]));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut table = QTable::new(4);
        table.update(Location::new(2, 1), 0, 1.0, 1.0);
        table.update(Location::new(1, 1), 3, -1.0, 1.0);

        let snapshot = table.snapshot();
        assert_eq!(snapshot.states[0].location, Location::new(1, 1));

        let mut restored = QTable::new(4);
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored, table);

        let mut wide = QTable::new(8);
        assert!(wide.restore(&snapshot).is_err());
        assert!(wide.is_empty());
    }
}
