//! Immutable puzzle definitions shared by sessions, the catalogue and generation.

use std::{collections::BTreeSet, time::SystemTime};

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use uuid::Uuid;

use crate::dao::models::{DirectionEntity, EntryEntity, PuzzleEntity};

/// Largest row or column index an answer may reach.
pub const MAX_GRID_INDEX: u32 = 255;

/// Orientation of an answer in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right.
    Across,
    /// Top to bottom.
    Down,
}

/// One answer of the puzzle with its starting cell and clue number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Upper-case answer.
    pub answer: String,
    /// Clue text.
    pub clue: String,
    /// 0-based row of the first letter.
    pub row: u32,
    /// 0-based column of the first letter.
    pub col: u32,
    /// Reading direction.
    pub direction: Direction,
    /// Clue number.
    pub number: u32,
}

impl Entry {
    /// Coordinates covered by the answer, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let len = self.answer.chars().count() as u32;
        (0..len).map(move |offset| match self.direction {
            Direction::Across => (self.row, self.col.saturating_add(offset)),
            Direction::Down => (self.row.saturating_add(offset), self.col),
        })
    }

    /// Last cell covered by the answer, or `None` when it runs past `u32::MAX`.
    pub fn end(&self) -> Option<(u32, u32)> {
        let span = (self.answer.chars().count() as u32).saturating_sub(1);
        match self.direction {
            Direction::Across => Some((self.row, self.col.checked_add(span)?)),
            Direction::Down => Some((self.row.checked_add(span)?, self.col)),
        }
    }
}

/// Puzzle definition loaded from storage. Never mutated once built.
#[derive(Debug, Clone)]
pub struct PuzzleDefinition {
    /// Puzzle id.
    pub id: Uuid,
    /// Display title, if any.
    pub title: Option<String>,
    /// Publication date as uploaded.
    pub date: Option<String>,
    /// Explicit publication year.
    pub year: Option<i32>,
    /// Owner of a generated puzzle.
    pub owner_id: Option<String>,
    /// Requested size of a generated puzzle.
    pub size: Option<u32>,
    /// Creation time.
    pub created_at: SystemTime,
    entries: Vec<Entry>,
    answer_cells: BTreeSet<(u32, u32)>,
}

impl PuzzleDefinition {
    /// Build a definition, computing the answer-cell set once.
    pub fn new(id: Uuid, title: Option<String>, entries: Vec<Entry>) -> Self {
        let answer_cells = entries.iter().flat_map(Entry::cells).collect();
        Self {
            id,
            title,
            date: None,
            year: None,
            owner_id: None,
            size: None,
            created_at: SystemTime::now(),
            entries,
            answer_cells,
        }
    }

    /// Entries in stored order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Distinct coordinates covered by at least one entry.
    pub fn answer_cells(&self) -> &BTreeSet<(u32, u32)> {
        &self.answer_cells
    }

    /// Number of distinct answer cells (crossings count once).
    pub fn total_answer_cells(&self) -> usize {
        self.answer_cells.len()
    }

    /// Grid dimensions as `(rows, cols)`.
    ///
    /// Generated puzzles keep their requested size even when the layout does not fill it.
    pub fn dimensions(&self) -> (u32, u32) {
        let (rows, cols) = self
            .answer_cells
            .iter()
            .fold((0, 0), |(rows, cols), &(row, col)| {
                (rows.max(row.saturating_add(1)), cols.max(col.saturating_add(1)))
            });
        match self.size {
            Some(size) => (rows.max(size), cols.max(size)),
            None => (rows, cols),
        }
    }

    /// Whether `(row, col)` belongs to an answer.
    pub fn is_answer_cell(&self, row: u32, col: u32) -> bool {
        self.answer_cells.contains(&(row, col))
    }

    /// Publication year: explicit `year`, else the year of `date`, else the creation year.
    pub fn publication_year(&self) -> i32 {
        publication_year(self.year, self.date.as_deref(), self.created_at)
    }

    /// Parsed `date`, accepting `YYYY-MM-DD` or a full RFC 3339 timestamp.
    pub fn publication_date(&self) -> Option<Date> {
        self.date.as_deref().and_then(parse_puzzle_date)
    }
}

/// Year a puzzle is filed under: explicit `year`, else the year of `date`, else the
/// creation year.
pub fn publication_year(year: Option<i32>, date: Option<&str>, created_at: SystemTime) -> i32 {
    year.or_else(|| date.and_then(parse_puzzle_date).map(|date| date.year()))
        .unwrap_or_else(|| OffsetDateTime::from(created_at).year())
}

/// Calendar day a puzzle is filed under: its `date`, else the day it was created.
pub fn publication_day(date: Option<&str>, created_at: SystemTime) -> Date {
    date.and_then(parse_puzzle_date)
        .unwrap_or_else(|| OffsetDateTime::from(created_at).date())
}

/// Parse a stored puzzle date (`YYYY-MM-DD` or RFC 3339).
pub fn parse_puzzle_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|dt| dt.date()))
}

impl From<DirectionEntity> for Direction {
    fn from(value: DirectionEntity) -> Self {
        match value {
            DirectionEntity::Across => Direction::Across,
            DirectionEntity::Down => Direction::Down,
        }
    }
}

impl From<Direction> for DirectionEntity {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Across => DirectionEntity::Across,
            Direction::Down => DirectionEntity::Down,
        }
    }
}

impl From<EntryEntity> for Entry {
    fn from(value: EntryEntity) -> Self {
        Self {
            answer: value.answer,
            clue: value.clue,
            row: value.row,
            col: value.col,
            direction: value.direction.into(),
            number: value.number,
        }
    }
}

impl From<Entry> for EntryEntity {
    fn from(value: Entry) -> Self {
        Self {
            answer: value.answer,
            clue: value.clue,
            row: value.row,
            col: value.col,
            direction: value.direction.into(),
            number: value.number,
        }
    }
}

impl From<PuzzleEntity> for PuzzleDefinition {
    fn from(value: PuzzleEntity) -> Self {
        let entries = value.entries.into_iter().map(Entry::from).collect();
        Self {
            date: value.date,
            year: value.year,
            owner_id: value.owner_id,
            size: value.size,
            created_at: value.created_at,
            ..Self::new(value.id, value.title, entries)
        }
    }
}

impl From<PuzzleDefinition> for PuzzleEntity {
    fn from(value: PuzzleDefinition) -> Self {
        Self {
            id: value.id,
            title: value.title,
            date: value.date,
            year: value.year,
            owner_id: value.owner_id,
            size: value.size,
            created_at: value.created_at,
            entries: value.entries.into_iter().map(EntryEntity::from).collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(answer: &str, row: u32, col: u32, direction: Direction, number: u32) -> Entry {
        Entry {
            answer: answer.into(),
            clue: format!("clue for {answer}"),
            row,
            col,
            direction,
            number,
        }
    }

    /// CAT across and CAR down, both starting at the top-left corner.
    pub(crate) fn cat_car() -> PuzzleDefinition {
        PuzzleDefinition::new(
            Uuid::new_v4(),
            Some("Cats".into()),
            vec![
                entry("CAT", 0, 0, Direction::Across, 1),
                entry("CAR", 0, 0, Direction::Down, 1),
            ],
        )
    }

    #[test]
    fn crossing_cells_count_once() {
        let puzzle = cat_car();
        assert_eq!(puzzle.total_answer_cells(), 5);
        assert!(puzzle.is_answer_cell(0, 2));
        assert!(puzzle.is_answer_cell(2, 0));
        assert!(!puzzle.is_answer_cell(1, 1));
        assert_eq!(puzzle.dimensions(), (3, 3));
    }

    #[test]
    fn generated_size_widens_dimensions() {
        let mut puzzle = cat_car();
        puzzle.size = Some(10);
        assert_eq!(puzzle.dimensions(), (10, 10));
    }

    #[test]
    fn publication_year_prefers_explicit_year_then_date() {
        let mut puzzle = cat_car();
        puzzle.date = Some("1999-03-14".into());
        assert_eq!(puzzle.publication_year(), 1999);

        puzzle.year = Some(2004);
        assert_eq!(puzzle.publication_year(), 2004);

        puzzle.year = None;
        puzzle.date = Some("2012-06-01T10:00:00Z".into());
        assert_eq!(puzzle.publication_year(), 2012);
    }

    #[test]
    fn entity_round_trip_keeps_metadata() {
        let mut puzzle = cat_car();
        puzzle.owner_id = Some("alice".into());
        puzzle.size = Some(15);
        let entity: PuzzleEntity = puzzle.clone().into();
        let back = PuzzleDefinition::from(entity);
        assert_eq!(back.owner_id.as_deref(), Some("alice"));
        assert_eq!(back.size, Some(15));
        assert_eq!(back.entries(), puzzle.entries());
        assert_eq!(back.total_answer_cells(), 5);
    }
}
