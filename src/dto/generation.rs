use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GeneratePuzzleRequest {
    /// Grid size; must be one of the configured sizes.
    pub size: u32,
}

/// A puzzle generated for the caller, with its completion.
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedPuzzleSummary {
    pub id: Uuid,
    pub size: Option<u32>,
    pub created_at: String,
    pub word_count: usize,
    pub percent_complete: u8,
    pub last_saved: Option<String>,
}
