//! Error types for the Maze Agents crate.

use crate::persistence::PersistenceError;
use crate::types::Location;
use thiserror::Error;

/// A specialized `Result` type for navigation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a start or goal location was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFault {
    /// The location lies outside the grid.
    OutOfBounds,
    /// The location is a wall cell.
    Wall,
    /// Start and goal are the same cell.
    Coincident,
}

impl std::fmt::Display for EndpointFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointFault::OutOfBounds => write!(f, "out of bounds"),
            EndpointFault::Wall => write!(f, "wall cell"),
            EndpointFault::Coincident => write!(f, "start equals goal"),
        }
    }
}

/// The primary error enum for all operations within the `maze_agents` crate.
///
/// None of these are fatal: each one ends the current search, episode or
/// rollout and leaves learned state intact.
#[derive(Error, Debug)]
pub enum Error {
    /// Start or goal was rejected before a search or training run began.
    #[error("Invalid endpoint {location}: {fault}")]
    InvalidEndpoint {
        location: Location,
        fault: EndpointFault,
    },

    /// Training or a query was requested before endpoints were chosen.
    #[error("Start and goal have not been set")]
    EndpointsUnset,

    /// The grid does not have two free interior cells to pick endpoints from.
    #[error("Grid has {0} free interior cells, need at least 2")]
    InsufficientFreeCells(usize),

    /// The A* open set emptied before the goal was expanded.
    #[error("Open set exhausted after {expansions} expansions; goal unreachable")]
    Exhausted { expansions: usize },

    /// A greedy rollout reached a state that training never visited.
    #[error("No table entry for state {0}")]
    MissingTableEntry(Location),

    /// A rollout or episode stopped making progress.
    #[error("Trapped at {0}")]
    TrappedLoop(Location),

    /// A safety bound on a rollout or search was reached.
    #[error("Could not complete within {0} iterations")]
    IterationCapExceeded(usize),

    /// An error related to configuration values or parsing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error from the table store.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl Error {
    /// Returns `true` for failures that more training may fix.
    pub fn is_training_gap(&self) -> bool {
        matches!(
            self,
            Error::MissingTableEntry(_) | Error::TrappedLoop(_) | Error::IterationCapExceeded(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                Error::InvalidEndpoint {
                    location: Location::new(0, 0),
                    fault: EndpointFault::Wall,
                },
                "Invalid endpoint (0, 0): wall cell",
            ),
            (
                Error::EndpointsUnset,
                "Start and goal have not been set",
            ),
            (
                Error::Exhausted { expansions: 12 },
                "Open set exhausted after 12 expansions; goal unreachable",
            ),
            (
                Error::MissingTableEntry(Location::new(2, 3)),
                "No table entry for state (2, 3)",
            ),
            (Error::TrappedLoop(Location::new(1, 1)), "Trapped at (1, 1)"),
            (
                Error::IterationCapExceeded(1000),
                "Could not complete within 1000 iterations",
            ),
            (
                Error::Config("bad rate".into()),
                "Configuration error: bad rate",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_training_gap_classification() {
        assert!(Error::MissingTableEntry(Location::new(0, 0)).is_training_gap());
        assert!(Error::IterationCapExceeded(5).is_training_gap());
        assert!(!Error::EndpointsUnset.is_training_gap());
        assert!(!Error::Exhausted { expansions: 0 }.is_training_gap());
    }

    #[test]
    fn test_from_toml_error() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let error: Error = parsed.unwrap_err().into();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<()> {
            Err(Error::TrappedLoop(Location::new(4, 4)))
        }
        assert!(returns_error().is_err());
    }
}
