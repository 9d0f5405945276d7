use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod crossword;
pub mod generation;
pub mod health;
pub mod progress;
pub mod puzzle;
pub mod sse;
pub mod validation;
pub mod word_set;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
