//! Admin curation of the word sets used to seed generated puzzles.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{WordEntity, WordSetEntity},
    dto::word_set::{
        CreateWordSetRequest, ReplaceWordRequest, UpdateWordSetRequest, WordRequest,
        WordSetSummary,
    },
    error::ServiceError,
    state::SharedState,
};

/// Every word set, sorted by name.
pub async fn list_word_sets(state: &SharedState) -> Result<Vec<WordSetSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut sets = store.list_word_sets().await?;
    sets.sort_by_key(|set| set.name.to_lowercase());
    Ok(sets.into_iter().map(Into::into).collect())
}

/// Create a word set; names are unique ignoring case.
pub async fn create_word_set(
    state: &SharedState,
    request: CreateWordSetRequest,
) -> Result<WordSetSummary, ServiceError> {
    let store = state.require_store().await?;
    let name = request.name.trim().to_owned();
    ensure_unique_name(&store.list_word_sets().await?, &name, None)?;

    let set = WordSetEntity {
        id: Uuid::new_v4(),
        name,
        weighting: request.weighting,
        words: Vec::new(),
    };
    store.save_word_set(set.clone()).await?;
    info!(word_set_id = %set.id, name = %set.name, "created word set");
    Ok(set.into())
}

/// Rename and/or re-weight a set.
pub async fn update_word_set(
    state: &SharedState,
    id: Uuid,
    request: UpdateWordSetRequest,
) -> Result<WordSetSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut set = load(state, id).await?;

    if let Some(name) = request.name {
        let name = name.trim().to_owned();
        ensure_unique_name(&store.list_word_sets().await?, &name, Some(id))?;
        set.name = name;
    }
    if let Some(weighting) = request.weighting {
        set.weighting = weighting;
    }

    store.save_word_set(set.clone()).await?;
    Ok(set.into())
}

/// Delete a word set. Puzzles generated from it are kept.
pub async fn delete_word_set(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_word_set(id).await? {
        return Err(not_found(id));
    }
    info!(word_set_id = %id, "deleted word set");
    Ok(())
}

/// Add a word; an identical `{word, clue}` pair already in the set is left alone.
pub async fn add_word(
    state: &SharedState,
    id: Uuid,
    request: WordRequest,
) -> Result<WordSetSummary, ServiceError> {
    let mut set = load(state, id).await?;
    if insert_word(&mut set, request.into()) {
        state.require_store().await?.save_word_set(set.clone()).await?;
    }
    Ok(set.into())
}

/// Swap the `old` pair for the `new` one.
pub async fn replace_word(
    state: &SharedState,
    id: Uuid,
    request: ReplaceWordRequest,
) -> Result<WordSetSummary, ServiceError> {
    let mut set = load(state, id).await?;
    let old = WordEntity::from(request.old);
    if !remove_word(&mut set, &old) {
        return Err(word_not_found(&old, id));
    }
    insert_word(&mut set, request.new.into());

    state.require_store().await?.save_word_set(set.clone()).await?;
    Ok(set.into())
}

/// Remove the exact `{word, clue}` pair from a set.
pub async fn delete_word(
    state: &SharedState,
    id: Uuid,
    request: WordRequest,
) -> Result<WordSetSummary, ServiceError> {
    let mut set = load(state, id).await?;
    let word = WordEntity::from(request);
    if !remove_word(&mut set, &word) {
        return Err(word_not_found(&word, id));
    }

    state.require_store().await?.save_word_set(set.clone()).await?;
    Ok(set.into())
}

async fn load(state: &SharedState, id: Uuid) -> Result<WordSetEntity, ServiceError> {
    state
        .require_store()
        .await?
        .find_word_set(id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn ensure_unique_name(
    existing: &[WordSetEntity],
    name: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken = existing
        .iter()
        .any(|set| Some(set.id) != except && set.name.eq_ignore_ascii_case(name));
    if taken {
        Err(ServiceError::InvalidState(format!(
            "a word set named `{name}` already exists"
        )))
    } else {
        Ok(())
    }
}

fn insert_word(set: &mut WordSetEntity, word: WordEntity) -> bool {
    if set.words.contains(&word) {
        false
    } else {
        set.words.push(word);
        true
    }
}

fn remove_word(set: &mut WordSetEntity, word: &WordEntity) -> bool {
    let before = set.words.len();
    set.words.retain(|existing| existing != word);
    set.words.len() != before
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("word set `{id}` not found"))
}

fn word_not_found(word: &WordEntity, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("word `{}` not found in word set `{id}`", word.word))
}
