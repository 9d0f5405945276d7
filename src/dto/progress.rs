use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{crossword::CrosswordData, validation::validate_letter},
    progress::{Cell, CellEdit},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CellDto {
    pub row: u32,
    pub col: u32,
    pub letter: String,
}

impl From<Cell> for CellDto {
    fn from(cell: Cell) -> Self {
        Self {
            row: cell.row,
            col: cell.col,
            letter: cell.letter,
        }
    }
}

/// Letter typed into one cell; an empty letter clears it.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CellEditRequest {
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    #[validate(custom(function = "validate_letter"))]
    pub letter: String,
}

impl From<CellEditRequest> for CellEdit {
    fn from(request: CellEditRequest) -> Self {
        Self {
            row: request.row,
            col: request.col,
            letter: request.letter.trim().to_owned(),
        }
    }
}

/// State of an open solve session, ready for the rendering widget.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub puzzle_id: Uuid,
    pub title: Option<String>,
    pub rows: u32,
    pub cols: u32,
    pub data: CrosswordData,
    /// Sparse `{"row_col": letter}` map of the filled cells.
    pub fill: BTreeMap<String, String>,
    pub percent_complete: u8,
    pub total_answer_cells: usize,
    /// RFC 3339 time of the last successful save, absent until the first one.
    pub last_saved: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditResponse {
    pub percent_complete: u8,
    pub filled: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveResponse {
    pub percent_complete: u8,
    pub last_saved: String,
}

/// Outcome of closing a session; the session is discarded even when the flush fails.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseResponse {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
