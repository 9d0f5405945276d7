use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::CouchDaoError;
use crate::dao::models::{
    CellEntity, EntryEntity, ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity,
    WordEntity, WordSetEntity, progress_record_key,
};

pub const PUZZLE_PREFIX: &str = "puzzle::";
pub const WORD_SET_PREFIX: &str = "wordset::";
pub const PROGRESS_PREFIX: &str = "progress::";
pub const USER_PREFIX: &str = "user::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Minimal view of any document, used to fetch the current revision.
#[derive(Debug, Deserialize)]
pub struct CouchRevision {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPuzzleDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub puzzle: PuzzleBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    pub created_at: SystemTime,
    #[serde(default)]
    pub entries: Vec<EntryEntity>,
}

impl From<(PuzzleEntity, Option<String>)> for CouchPuzzleDocument {
    fn from((value, rev): (PuzzleEntity, Option<String>)) -> Self {
        Self {
            id: puzzle_doc_id(value.id),
            rev,
            puzzle: PuzzleBody {
                title: value.title,
                date: value.date,
                year: value.year,
                owner_id: value.owner_id,
                size: value.size,
                created_at: value.created_at,
                entries: value.entries,
            },
        }
    }
}

impl TryFrom<CouchPuzzleDocument> for PuzzleEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchPuzzleDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            title: doc.puzzle.title,
            date: doc.puzzle.date,
            year: doc.puzzle.year,
            owner_id: doc.puzzle.owner_id,
            size: doc.puzzle.size,
            created_at: doc.puzzle.created_at,
            entries: doc.puzzle.entries,
        })
    }
}

impl TryFrom<CouchPuzzleDocument> for PuzzleListItemEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchPuzzleDocument) -> Result<Self, Self::Error> {
        PuzzleEntity::try_from(doc).map(Into::into)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchWordSetDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    pub weighting: u8,
    #[serde(default)]
    pub words: Vec<WordEntity>,
}

impl From<(WordSetEntity, Option<String>)> for CouchWordSetDocument {
    fn from((value, rev): (WordSetEntity, Option<String>)) -> Self {
        Self {
            id: word_set_doc_id(value.id),
            rev,
            name: value.name,
            weighting: value.weighting,
            words: value.words,
        }
    }
}

impl TryFrom<CouchWordSetDocument> for WordSetEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchWordSetDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            name: doc.name,
            weighting: doc.weighting,
            words: doc.words,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchProgressDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub user_id: String,
    pub puzzle_id: Uuid,
    #[serde(default)]
    pub cells: Vec<CellEntity>,
    pub last_saved: SystemTime,
}

impl From<(ProgressEntity, Option<String>)> for CouchProgressDocument {
    fn from((value, rev): (ProgressEntity, Option<String>)) -> Self {
        Self {
            id: progress_doc_id(&value.user_id, value.puzzle_id),
            rev,
            user_id: value.user_id,
            puzzle_id: value.puzzle_id,
            cells: value.cells,
            last_saved: value.last_saved,
        }
    }
}

impl From<CouchProgressDocument> for ProgressEntity {
    fn from(doc: CouchProgressDocument) -> Self {
        Self {
            user_id: doc.user_id,
            puzzle_id: doc.puzzle_id,
            cells: doc.cells,
            last_saved: doc.last_saved,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouchUserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

impl From<CouchUserDocument> for UserEntity {
    fn from(doc: CouchUserDocument) -> Self {
        let uid = doc
            .id
            .strip_prefix(USER_PREFIX)
            .map(str::to_owned)
            .unwrap_or(doc.id);
        Self {
            uid,
            email: doc.email,
            admin: doc.admin,
        }
    }
}

pub fn puzzle_doc_id(id: Uuid) -> String {
    format!("{}{}", PUZZLE_PREFIX, id)
}

pub fn word_set_doc_id(id: Uuid) -> String {
    format!("{}{}", WORD_SET_PREFIX, id)
}

pub fn progress_doc_id(user_id: &str, puzzle_id: Uuid) -> String {
    format!("{}{}", PROGRESS_PREFIX, progress_record_key(user_id, puzzle_id))
}

pub fn user_doc_id(uid: &str) -> String {
    format!("{}{}", USER_PREFIX, uid)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_doc_id_wraps_the_record_key() {
        let puzzle_id = Uuid::new_v4();
        assert_eq!(
            progress_doc_id("alice", puzzle_id),
            format!("progress::alice_{puzzle_id}")
        );
    }

    #[test]
    fn extract_uuid_rejects_malformed_ids() {
        let id = Uuid::new_v4();
        assert_eq!(extract_uuid(&puzzle_doc_id(id)).unwrap(), id);
        assert!(matches!(
            extract_uuid("puzzle-123"),
            Err(CouchDaoError::InvalidDocId {
                kind: "missing separator",
                ..
            })
        ));
        assert!(matches!(
            extract_uuid("puzzle::nope"),
            Err(CouchDaoError::InvalidDocId {
                kind: "invalid UUID",
                ..
            })
        ));
    }

    #[test]
    fn user_document_strips_prefix() {
        let doc = CouchUserDocument {
            id: user_doc_id("uid-1"),
            email: Some("a@example.com".into()),
            admin: true,
        };
        let user: UserEntity = doc.into();
        assert_eq!(user.uid, "uid-1");
        assert!(user.admin);
    }
}
