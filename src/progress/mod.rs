//! Solve-state tracking and write-behind persistence of a user's progress on a puzzle.

pub mod persister;
pub mod tracker;

pub use persister::{ProgressKey, ProgressPersister, SaveOutcome};
pub use tracker::{
    Cell, CellEdit, ProgressState, apply_edit, completion_percent, filled_percent, initialize,
};
