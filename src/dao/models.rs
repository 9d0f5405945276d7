//! Storage entities shared by every backend.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Puzzle definition as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleEntity {
    /// Stable identifier for the puzzle.
    pub id: Uuid,
    /// Optional display title (pre-made puzzles usually carry one).
    pub title: Option<String>,
    /// Publication date of a pre-made puzzle (`YYYY-MM-DD` or RFC 3339).
    pub date: Option<String>,
    /// Explicit publication year, takes precedence over `date`.
    pub year: Option<i32>,
    /// Owner of a generated puzzle; `None` for the shared pre-made catalogue.
    pub owner_id: Option<String>,
    /// Requested grid size for generated puzzles.
    pub size: Option<u32>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Placed answers making up the solution grid.
    pub entries: Vec<EntryEntity>,
}

/// One answer placed in the grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryEntity {
    /// Upper-case answer letters.
    pub answer: String,
    /// Clue shown to the solver.
    pub clue: String,
    /// 0-based row of the first letter.
    pub row: u32,
    /// 0-based column of the first letter.
    pub col: u32,
    /// Reading direction of the answer.
    pub direction: DirectionEntity,
    /// Clue number printed in the starting cell.
    pub number: u32,
}

/// Stored reading direction of an entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectionEntity {
    /// Left to right.
    Across,
    /// Top to bottom.
    Down,
}

/// Listing projection of a puzzle (everything but the entries).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleListItemEntity {
    /// Stable identifier for the puzzle.
    pub id: Uuid,
    /// Optional display title.
    pub title: Option<String>,
    /// Publication date as stored.
    pub date: Option<String>,
    /// Explicit publication year.
    pub year: Option<i32>,
    /// Owner of a generated puzzle.
    pub owner_id: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl From<PuzzleEntity> for PuzzleListItemEntity {
    fn from(entity: PuzzleEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            date: entity.date,
            year: entity.year,
            owner_id: entity.owner_id,
            created_at: entity.created_at,
        }
    }
}

/// Curated list of words and clues used to seed generated puzzles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordSetEntity {
    /// Stable identifier for the word set.
    pub id: Uuid,
    /// Display name of the set.
    pub name: String,
    /// Relative weight (1..=100) used when sampling words for generation.
    pub weighting: u8,
    /// Words of the set, without duplicates.
    pub words: Vec<WordEntity>,
}

/// One word of a word set with its clue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordEntity {
    /// Upper-case answer.
    pub word: String,
    /// Clue used when the word is placed.
    pub clue: String,
}

/// Persisted snapshot of a user's filled cells for one puzzle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Owner of the progress.
    pub user_id: String,
    /// Puzzle being solved.
    pub puzzle_id: Uuid,
    /// Filled cells, one per coordinate.
    pub cells: Vec<CellEntity>,
    /// Time of the write, stamped by the persister right before the upsert.
    pub last_saved: SystemTime,
}

impl ProgressEntity {
    /// Deterministic record key, see [`progress_record_key`].
    pub fn record_key(&self) -> String {
        progress_record_key(&self.user_id, self.puzzle_id)
    }
}

/// Letter stored for one grid cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellEntity {
    /// 0-based row.
    pub row: u32,
    /// 0-based column.
    pub col: u32,
    /// Entered letter.
    pub letter: String,
}

/// User profile document maintained next to the external authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Identifier issued by the authentication provider.
    pub uid: String,
    /// Contact email, if known.
    pub email: Option<String>,
    /// Grants access to the `/admin` routes.
    #[serde(default)]
    pub admin: bool,
}

/// Key of the progress record for `(user_id, puzzle_id)`.
///
/// The puzzle id is a fixed-width UUID at the end of the key, so distinct pairs can never
/// collide even when user ids contain the separator.
pub fn progress_record_key(user_id: &str, puzzle_id: Uuid) -> String {
    format!("{user_id}_{puzzle_id}")
}
