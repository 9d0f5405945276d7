use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{WordEntity, WordSetEntity},
    dto::validation::{validate_clue, validate_word},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WordDto {
    pub word: String,
    pub clue: String,
}

impl From<WordEntity> for WordDto {
    fn from(value: WordEntity) -> Self {
        Self {
            word: value.word,
            clue: value.clue,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordSetSummary {
    pub id: Uuid,
    pub name: String,
    pub weighting: u8,
    pub words: Vec<WordDto>,
}

impl From<WordSetEntity> for WordSetSummary {
    fn from(value: WordSetEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            weighting: value.weighting,
            words: value.words.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateWordSetRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(range(min = 1, max = 100))]
    pub weighting: u8,
}

/// Rename and/or re-weight a set; omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateWordSetRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub weighting: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct WordRequest {
    #[validate(custom(function = "validate_word"))]
    pub word: String,
    #[validate(custom(function = "validate_clue"))]
    pub clue: String,
}

impl From<WordRequest> for WordEntity {
    fn from(value: WordRequest) -> Self {
        Self {
            word: value.word.trim().to_uppercase(),
            clue: value.clue.trim().to_owned(),
        }
    }
}

/// Swap one `{word, clue}` pair for another.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReplaceWordRequest {
    #[validate(nested)]
    pub old: WordRequest,
    #[validate(nested)]
    pub new: WordRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_requests_are_normalised() {
        let entity: WordEntity = WordRequest {
            word: "  emu ".into(),
            clue: " Flightless bird ".into(),
        }
        .into();
        assert_eq!(entity.word, "EMU");
        assert_eq!(entity.clue, "Flightless bird");
    }

    #[test]
    fn replace_request_validates_both_words() {
        let request = ReplaceWordRequest {
            old: WordRequest {
                word: "cat".into(),
                clue: "pet".into(),
            },
            new: WordRequest {
                word: "x".into(),
                clue: "".into(),
            },
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn weighting_must_stay_in_range() {
        let request = CreateWordSetRequest {
            name: "Animals".into(),
            weighting: 0,
        };
        assert!(request.validate().is_err());
        let request = CreateWordSetRequest {
            name: "Animals".into(),
            weighting: 100,
        };
        assert!(request.validate().is_ok());
    }
}
