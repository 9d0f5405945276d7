//! Boundary with the external crossword layout generator.
//!
//! The service never searches for layouts itself: it selects words, hands them to a
//! [`LayoutGenerator`] and numbers whatever placements come back.

#[cfg(feature = "http-layout")]
pub mod http;
pub mod selection;

use std::collections::BTreeSet;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::state::puzzle::{Direction, Entry};

/// Word offered to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordClue {
    /// Upper-case answer.
    pub answer: String,
    /// Clue kept with the answer.
    pub clue: String,
}

/// Word placed by the generator, with 0-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Placed answer.
    pub answer: String,
    /// Clue of the placed answer.
    pub clue: String,
    /// 0-based row of the first letter.
    pub row: u32,
    /// 0-based column of the first letter.
    pub col: u32,
    /// Reading direction.
    pub direction: Direction,
}

/// Placements returned for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Rows used by the layout.
    pub rows: u32,
    /// Columns used by the layout.
    pub cols: u32,
    /// Words that found a place.
    pub placements: Vec<Placement>,
}

/// Why no layout came back.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The generator could not place any word.
    #[error("no layout could be produced for the selected words")]
    NoLayout,
    /// The generator could not be reached.
    #[error("layout generator unavailable: {0}")]
    Unavailable(String),
    /// The generator answered with something unusable.
    #[error("invalid layout generator response: {0}")]
    InvalidResponse(String),
    /// No generator URL is configured.
    #[error("no layout generator configured")]
    NotConfigured,
}

/// Narrow interface to the layout generator.
pub trait LayoutGenerator: Send + Sync {
    /// Place as many of `words` as fit in a `size` x `size` grid.
    fn generate(&self, words: Vec<WordClue>, size: u32)
    -> BoxFuture<'static, Result<Layout, LayoutError>>;
}

/// Generator used when no layout service URL is configured; always fails.
pub struct UnconfiguredLayoutGenerator;

impl LayoutGenerator for UnconfiguredLayoutGenerator {
    fn generate(
        &self,
        _words: Vec<WordClue>,
        _size: u32,
    ) -> BoxFuture<'static, Result<Layout, LayoutError>> {
        Box::pin(async { Err(LayoutError::NotConfigured) })
    }
}

/// Turn placements into numbered entries.
///
/// Start cells are numbered in reading order; an across and a down word sharing a start
/// cell share its number.
pub fn number_entries(placements: Vec<Placement>) -> Vec<Entry> {
    let starts: BTreeSet<(u32, u32)> = placements.iter().map(|p| (p.row, p.col)).collect();
    let number_of = |row: u32, col: u32| {
        starts
            .iter()
            .position(|&start| start == (row, col))
            .map_or(0, |index| index as u32 + 1)
    };

    let mut entries: Vec<Entry> = placements
        .into_iter()
        .map(|placement| Entry {
            number: number_of(placement.row, placement.col),
            answer: placement.answer,
            clue: placement.clue,
            row: placement.row,
            col: placement.col,
            direction: placement.direction,
        })
        .collect();
    entries.sort_by_key(|entry| (entry.number, entry.direction == Direction::Down));
    entries
}
