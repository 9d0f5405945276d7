use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{crossword::CrosswordData, format_system_time},
    state::puzzle::PuzzleDefinition,
};

/// Filters accepted by the pre-made catalogue.
///
/// `year`, `decade` and the date range (`date_from`/`date_to`) are mutually exclusive.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PuzzleListQuery {
    /// Case-insensitive title prefix.
    pub title_prefix: Option<String>,
    pub year: Option<i32>,
    /// First year of a decade, e.g. `1990`.
    pub decade: Option<i32>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    /// English weekday name, e.g. `Monday`.
    pub weekday: Option<String>,
    /// 1-based page number.
    #[validate(range(min = 1))]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PuzzleListItem {
    pub id: Uuid,
    pub title: Option<String>,
    pub date: Option<String>,
    pub year: i32,
}

/// One page of the catalogue.
#[derive(Debug, Serialize, ToSchema)]
pub struct PuzzlePage {
    pub items: Vec<PuzzleListItem>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Full puzzle definition shaped for the rendering widget.
#[derive(Debug, Serialize, ToSchema)]
pub struct PuzzleDetail {
    pub id: Uuid,
    pub title: Option<String>,
    pub date: Option<String>,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    pub rows: u32,
    pub cols: u32,
    pub total_answer_cells: usize,
    pub created_at: String,
    pub data: CrosswordData,
}

impl From<&PuzzleDefinition> for PuzzleDetail {
    fn from(definition: &PuzzleDefinition) -> Self {
        let (rows, cols) = definition.dimensions();
        Self {
            id: definition.id,
            title: definition.title.clone(),
            date: definition.date.clone(),
            year: definition.publication_year(),
            size: definition.size,
            rows,
            cols,
            total_answer_cells: definition.total_answer_cells(),
            created_at: format_system_time(definition.created_at),
            data: CrosswordData::from(definition),
        }
    }
}

/// Batch of puzzle documents uploaded by an administrator.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadPuzzlesRequest {
    /// Documents in the entries layout or the widget `across`/`down` layout.
    #[validate(length(min = 1, max = 500))]
    #[schema(value_type = Vec<Object>)]
    pub puzzles: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedDocument {
    /// Position of the document in the uploaded batch.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct UploadPuzzlesResponse {
    pub stored: Vec<Uuid>,
    pub rejected: Vec<RejectedDocument>,
}
