//! Data shapes consumed by the browser rendering widget, and parsing of uploaded puzzles.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::EntryEntity,
    progress::Cell,
    state::puzzle::{Direction, Entry, MAX_GRID_INDEX, PuzzleDefinition, parse_puzzle_date},
};

/// One clue as the widget expects it, keyed by its number in [`CrosswordData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClueData {
    pub clue: String,
    pub answer: String,
    pub row: u32,
    pub col: u32,
}

/// `{across: {number: clue}, down: {number: clue}}` in clue-number order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CrosswordData {
    #[serde(default)]
    pub across: IndexMap<String, ClueData>,
    #[serde(default)]
    pub down: IndexMap<String, ClueData>,
}

impl From<&PuzzleDefinition> for CrosswordData {
    fn from(definition: &PuzzleDefinition) -> Self {
        let mut entries: Vec<&Entry> = definition.entries().iter().collect();
        entries.sort_by_key(|entry| entry.number);

        let mut data = CrosswordData::default();
        for entry in entries {
            let clue = ClueData {
                clue: entry.clue.clone(),
                answer: entry.answer.clone(),
                row: entry.row,
                col: entry.col,
            };
            let target = match entry.direction {
                Direction::Across => &mut data.across,
                Direction::Down => &mut data.down,
            };
            target.insert(entry.number.to_string(), clue);
        }
        data
    }
}

impl CrosswordData {
    /// Convert widget clue maps back into entries; keys must be positive clue numbers.
    pub fn into_entries(self) -> Result<Vec<Entry>, String> {
        let across = self
            .across
            .into_iter()
            .map(|(key, clue)| (key, clue, Direction::Across));
        let down = self
            .down
            .into_iter()
            .map(|(key, clue)| (key, clue, Direction::Down));

        across
            .chain(down)
            .map(|(key, clue, direction)| {
                let number = key
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|number| *number > 0)
                    .ok_or_else(|| format!("invalid clue number `{key}`"))?;
                Ok(Entry {
                    answer: clue.answer,
                    clue: clue.clue,
                    row: clue.row,
                    col: clue.col,
                    direction,
                    number,
                })
            })
            .collect()
    }
}

/// Sparse `{"row_col": letter}` map used to pre-fill the widget.
pub fn fill_map(cells: &[Cell]) -> BTreeMap<String, String> {
    cells
        .iter()
        .map(|cell| (format!("{}_{}", cell.row, cell.col), cell.letter.clone()))
        .collect()
}

/// Uploaded puzzle document in any of the accepted layouts.
#[derive(Debug, Deserialize)]
struct UploadDocument {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    entries: Option<Vec<EntryEntity>>,
    #[serde(default)]
    data: Option<CrosswordData>,
    #[serde(default)]
    across: Option<IndexMap<String, ClueData>>,
    #[serde(default)]
    down: Option<IndexMap<String, ClueData>>,
}

/// Parse and validate one uploaded document into a pre-made puzzle definition.
///
/// Accepts the entries layout (`{entries: [...]}`), the widget layout nested under `data`,
/// or the widget `across`/`down` maps at the top level.
pub fn parse_upload(document: Value) -> Result<PuzzleDefinition, String> {
    let upload: UploadDocument =
        serde_json::from_value(document).map_err(|err| format!("malformed document: {err}"))?;

    let entries = if let Some(entries) = upload.entries {
        entries.into_iter().map(Entry::from).collect()
    } else if let Some(data) = upload.data {
        data.into_entries()?
    } else if upload.across.is_some() || upload.down.is_some() {
        CrosswordData {
            across: upload.across.unwrap_or_default(),
            down: upload.down.unwrap_or_default(),
        }
        .into_entries()?
    } else {
        return Err("document has no entries, data or across/down clues".into());
    };

    let entries = normalise_entries(entries)?;

    let date = upload
        .date
        .map(|date| date.trim().to_owned())
        .filter(|date| !date.is_empty());
    if let Some(date) = &date {
        if parse_puzzle_date(date).is_none() {
            return Err(format!("unrecognised date `{date}`"));
        }
    }

    let title = upload
        .title
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty());

    let mut definition =
        PuzzleDefinition::new(upload.id.unwrap_or_else(Uuid::new_v4), title, entries);
    definition.date = date;
    definition.year = upload.year;
    Ok(definition)
}

fn normalise_entries(entries: Vec<Entry>) -> Result<Vec<Entry>, String> {
    if entries.is_empty() {
        return Err("puzzle has no entries".into());
    }
    entries
        .into_iter()
        .map(|mut entry| {
            entry.answer = entry.answer.trim().to_uppercase();
            entry.clue = entry.clue.trim().to_owned();
            if entry.answer.is_empty() || !entry.answer.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(format!(
                    "answer `{}` for clue {} must contain only letters",
                    entry.answer, entry.number
                ));
            }
            if entry.clue.is_empty() {
                return Err(format!("clue {} is empty", entry.number));
            }
            match entry.end() {
                Some((row, col)) if row <= MAX_GRID_INDEX && col <= MAX_GRID_INDEX => Ok(entry),
                _ => Err(format!(
                    "answer `{}` for clue {} runs outside the grid (max index {MAX_GRID_INDEX})",
                    entry.answer, entry.number
                )),
            }
        })
        .collect()
}
