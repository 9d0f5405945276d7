//! Pure edit application and completion metrics over a sparse grid of filled cells.

use std::{collections::BTreeMap, time::SystemTime};

use uuid::Uuid;

use crate::state::puzzle::PuzzleDefinition;

/// Letter entered in one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub letter: String,
}

/// User input on one cell; an empty (or blank) letter clears the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub row: u32,
    pub col: u32,
    pub letter: String,
}

/// Filled cells of one user's solve of one puzzle.
///
/// Cells are keyed by coordinate so a coordinate holds at most one letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    puzzle_id: Uuid,
    cells: BTreeMap<(u32, u32), String>,
    last_saved: Option<SystemTime>,
}

impl ProgressState {
    pub fn puzzle_id(&self) -> Uuid {
        self.puzzle_id
    }

    /// Snapshot of the filled cells in row-major order.
    pub fn cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .map(|(&(row, col), letter)| Cell {
                row,
                col,
                letter: letter.clone(),
            })
            .collect()
    }

    pub fn filled(&self) -> usize {
        self.cells.len()
    }

    pub fn letter_at(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    /// Time of the last successful persist, unset until the first one.
    pub fn last_saved(&self) -> Option<SystemTime> {
        self.last_saved
    }

    /// Record a successful persist. Older timestamps never overwrite newer ones.
    pub fn mark_saved(&mut self, at: SystemTime) {
        if self.last_saved.is_none_or(|current| current < at) {
            self.last_saved = Some(at);
        }
    }
}

/// Create the solve state for `definition`, seeded with `restored` cells when a record exists.
pub fn initialize(definition: &PuzzleDefinition, restored: Option<Vec<Cell>>) -> ProgressState {
    let cells = restored
        .unwrap_or_default()
        .into_iter()
        .map(|cell| ((cell.row, cell.col), cell.letter))
        .collect();
    ProgressState {
        puzzle_id: definition.id,
        cells,
        last_saved: None,
    }
}

/// Apply one edit: drop whatever the coordinate held, then store the letter unless it is blank.
pub fn apply_edit(mut state: ProgressState, edit: CellEdit) -> ProgressState {
    let coordinate = (edit.row, edit.col);
    state.cells.remove(&coordinate);
    if !edit.letter.trim().is_empty() {
        state.cells.insert(coordinate, edit.letter);
    }
    state
}

/// Share of answer cells holding a letter, rounded to the nearest integer percent.
pub fn completion_percent(state: &ProgressState, definition: &PuzzleDefinition) -> u8 {
    filled_percent(definition, state.cells.keys().copied())
}

/// Percent of `definition`'s answer cells among `filled`. Coordinates outside the answers
/// (left over from an older version of the puzzle) do not count.
pub fn filled_percent(
    definition: &PuzzleDefinition,
    filled: impl IntoIterator<Item = (u32, u32)>,
) -> u8 {
    let filled = filled
        .into_iter()
        .filter(|&(row, col)| definition.is_answer_cell(row, col))
        .count();
    percent(filled, definition.total_answer_cells())
}

/// `round(100 * filled / total)` clamped to `0..=100`; zero when `total` is zero.
pub fn percent(filled: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (filled * 200 + total) / (2 * total);
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::puzzle::tests::cat_car;

    fn edit(row: u32, col: u32, letter: &str) -> CellEdit {
        CellEdit {
            row,
            col,
            letter: letter.into(),
        }
    }

    fn cell(row: u32, col: u32, letter: &str) -> Cell {
        Cell {
            row,
            col,
            letter: letter.into(),
        }
    }

    #[test]
    fn repeated_edits_keep_one_letter_per_cell() {
        let puzzle = cat_car();
        let mut state = initialize(&puzzle, None);
        for letter in ["C", "X", "C", "Q"] {
            state = apply_edit(state, edit(0, 0, letter));
        }
        state = apply_edit(state, edit(0, 1, "A"));
        state = apply_edit(state, edit(0, 1, "A"));

        assert_eq!(state.filled(), 2);
        assert_eq!(state.letter_at(0, 0), Some("Q"));
        assert_eq!(state.cells(), vec![cell(0, 0, "Q"), cell(0, 1, "A")]);
    }

    #[test]
    fn clearing_an_empty_cell_is_a_noop() {
        let puzzle = cat_car();
        let state = apply_edit(initialize(&puzzle, None), edit(0, 0, "C"));
        let after = apply_edit(state.clone(), edit(2, 0, ""));
        assert_eq!(after, state);

        let blank = apply_edit(state.clone(), edit(2, 0, "   "));
        assert_eq!(blank, state);
    }

    #[test]
    fn clearing_removes_the_letter() {
        let puzzle = cat_car();
        let state = apply_edit(initialize(&puzzle, None), edit(0, 0, "C"));
        let cleared = apply_edit(state, edit(0, 0, " "));
        assert_eq!(cleared.filled(), 0);
        assert_eq!(cleared.letter_at(0, 0), None);
    }

    #[test]
    fn percent_is_zero_when_empty_and_grows_with_additions() {
        let puzzle = cat_car();
        let mut state = initialize(&puzzle, None);
        assert_eq!(completion_percent(&state, &puzzle), 0);

        let mut previous = 0;
        for (row, col) in [(0, 0), (0, 1), (0, 2), (1, 0), (2, 0)] {
            state = apply_edit(state, edit(row, col, "X"));
            let current = completion_percent(&state, &puzzle);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn restored_cells_seed_the_state_exactly() {
        let puzzle = cat_car();
        let restored = vec![cell(0, 0, "C"), cell(1, 0, "A"), cell(2, 0, "R")];
        let state = initialize(&puzzle, Some(restored.clone()));
        assert_eq!(state.cells(), restored);
        assert_eq!(state.last_saved(), None);
        assert_eq!(state.puzzle_id(), puzzle.id);
    }

    #[test]
    fn stale_restored_cells_are_kept_but_not_counted() {
        let puzzle = cat_car();
        let state = initialize(&puzzle, Some(vec![cell(0, 0, "C"), cell(4, 4, "Z")]));
        assert_eq!(state.filled(), 2);
        assert_eq!(completion_percent(&state, &puzzle), 20);
        assert_eq!(filled_percent(&puzzle, [(0, 0), (4, 4)]), 20);
    }

    #[test]
    fn cat_and_car_share_the_corner() {
        let puzzle = cat_car();
        let state = apply_edit(initialize(&puzzle, None), edit(0, 0, "C"));
        let state = apply_edit(state, edit(0, 1, "A"));
        assert_eq!(completion_percent(&state, &puzzle), 40);
    }

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(9, 5), 100);
    }

    #[test]
    fn mark_saved_keeps_the_newest_timestamp() {
        let puzzle = cat_car();
        let mut state = initialize(&puzzle, None);
        let earlier = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(10);
        let later = earlier + std::time::Duration::from_secs(5);
        state.mark_saved(later);
        state.mark_saved(earlier);
        assert_eq!(state.last_saved(), Some(later));
    }
}
