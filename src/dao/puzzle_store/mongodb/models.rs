use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    CellEntity, EntryEntity, ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity,
    WordEntity, WordSetEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPuzzleDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    size: Option<u32>,
    created_at: DateTime,
    entries: Vec<EntryEntity>,
}

impl From<PuzzleEntity> for MongoPuzzleDocument {
    fn from(value: PuzzleEntity) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title,
            date: value.date,
            year: value.year,
            owner_id: value.owner_id,
            size: value.size,
            created_at: DateTime::from_system_time(value.created_at),
            entries: value.entries,
        }
    }
}

impl TryFrom<MongoPuzzleDocument> for PuzzleEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPuzzleDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            title: value.title,
            date: value.date,
            year: value.year,
            owner_id: value.owner_id,
            size: value.size,
            created_at: value.created_at.to_system_time(),
            entries: value.entries,
        })
    }
}

/// Listing projection; the entries are left out by the query projection.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoPuzzleListDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    owner_id: Option<String>,
    created_at: DateTime,
}

impl TryFrom<MongoPuzzleListDocument> for PuzzleListItemEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPuzzleListDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            title: value.title,
            date: value.date,
            year: value.year,
            owner_id: value.owner_id,
            created_at: value.created_at.to_system_time(),
        })
    }
}

pub fn puzzle_list_projection() -> Document {
    doc! { "entries": 0 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoWordSetDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    weighting: u8,
    #[serde(default)]
    words: Vec<WordEntity>,
}

impl From<WordSetEntity> for MongoWordSetDocument {
    fn from(value: WordSetEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            weighting: value.weighting,
            words: value.words,
        }
    }
}

impl TryFrom<MongoWordSetDocument> for WordSetEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoWordSetDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&value.id)?,
            name: value.name,
            weighting: value.weighting,
            words: value.words,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProgressDocument {
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    puzzle_id: String,
    #[serde(default)]
    cells: Vec<CellEntity>,
    last_saved: DateTime,
}

impl From<ProgressEntity> for MongoProgressDocument {
    fn from(value: ProgressEntity) -> Self {
        Self {
            id: value.record_key(),
            user_id: value.user_id,
            puzzle_id: value.puzzle_id.to_string(),
            cells: value.cells,
            last_saved: DateTime::from_system_time(value.last_saved),
        }
    }
}

impl TryFrom<MongoProgressDocument> for ProgressEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoProgressDocument) -> Result<Self, Self::Error> {
        let puzzle_id =
            Uuid::parse_str(&value.puzzle_id).map_err(|_| MongoDaoError::CorruptedDocument {
                id: value.id.clone(),
                reason: format!("invalid puzzle id `{}`", value.puzzle_id),
            })?;
        Ok(Self {
            user_id: value.user_id,
            puzzle_id,
            cells: value.cells,
            last_saved: value.last_saved.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    admin: bool,
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            uid: value.id,
            email: value.email,
            admin: value.admin,
        }
    }
}

pub fn doc_id(id: impl Into<String>) -> Document {
    doc! {"_id": id.into()}
}

fn parse_id(id: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(id).map_err(|_| MongoDaoError::CorruptedDocument {
        id: id.to_owned(),
        reason: "invalid UUID".into(),
    })
}
