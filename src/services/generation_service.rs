//! Puzzles generated on demand from the weighted word sets.

use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::PuzzleEntity,
    dto::{format_system_time, generation::GeneratedPuzzleSummary},
    error::ServiceError,
    layout::{number_entries, selection::select_words},
    progress::{ProgressKey, filled_percent},
    services::session_service,
    state::{SharedState, puzzle::PuzzleDefinition},
};

/// Generate a `size`×`size` puzzle for `owner_id` and store it.
pub async fn generate(
    state: &SharedState,
    owner_id: &str,
    size: u32,
) -> Result<GeneratedPuzzleSummary, ServiceError> {
    let allowed = state.config().puzzle_sizes();
    if !allowed.contains(&size) {
        return Err(ServiceError::InvalidInput(format!(
            "unsupported size {size}; expected one of {allowed:?}"
        )));
    }

    let store = state.require_store().await?;
    let word_sets = store.list_word_sets().await?;
    let words = {
        let mut rng = rand::rng();
        select_words(&word_sets, size, &mut rng)
    };
    if words.is_empty() {
        return Err(ServiceError::InvalidInput("no words available".into()));
    }

    let word_count = words.len();
    let layout = state
        .layout()
        .generate(words, size)
        .await
        .map_err(|err| {
            warn!(owner_id, size, word_count, error = %err, "layout generation failed");
            ServiceError::from(err)
        })?;

    let mut definition = PuzzleDefinition::new(Uuid::new_v4(), None, number_entries(layout.placements));
    definition.owner_id = Some(owner_id.to_owned());
    definition.size = Some(size);

    let entity = PuzzleEntity::from(definition);
    store.save_puzzle(entity.clone()).await?;
    info!(
        owner_id,
        puzzle_id = %entity.id,
        size,
        placed = entity.entries.len(),
        "generated puzzle"
    );

    Ok(summary(&entity, 0, None))
}

/// The caller's generated puzzles, newest first, with their completion.
///
/// Open sessions report their live percent; others use the stored progress record.
pub async fn list_generated(
    state: &SharedState,
    owner_id: &str,
) -> Result<Vec<GeneratedPuzzleSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut puzzles = store.list_owned_puzzles(owner_id.to_owned()).await?;
    let progress: HashMap<Uuid, _> = store
        .list_progress(owner_id.to_owned())
        .await?
        .into_iter()
        .map(|record| (record.puzzle_id, record))
        .collect();

    puzzles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(puzzles
        .into_iter()
        .map(|entity| {
            let record = progress.get(&entity.id);
            let key = ProgressKey::new(owner_id, entity.id);
            let definition = PuzzleDefinition::from(entity.clone());
            let percent_complete = session_service::live_percent(state.sessions(), &key)
                .unwrap_or_else(|| {
                    filled_percent(
                        &definition,
                        record
                            .into_iter()
                            .flat_map(|record| record.cells.iter().map(|cell| (cell.row, cell.col))),
                    )
                });
            summary(
                &entity,
                percent_complete,
                record.map(|record| format_system_time(record.last_saved)),
            )
        })
        .collect())
}

fn summary(
    entity: &PuzzleEntity,
    percent_complete: u8,
    last_saved: Option<String>,
) -> GeneratedPuzzleSummary {
    GeneratedPuzzleSummary {
        id: entity.id,
        size: entity.size,
        created_at: format_system_time(entity.created_at),
        word_count: entity.entries.len(),
        percent_complete,
        last_saved,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{WordEntity, WordSetEntity},
            puzzle_store::{PuzzleStore, memory::MemoryPuzzleStore},
        },
        layout::{Layout, LayoutError, LayoutGenerator, Placement, WordClue},
        progress::CellEdit,
        state::{AppState, puzzle::Direction},
    };

    /// Places the first word across the top row and the second down the first column.
    struct CornerLayout {
        calls: AtomicUsize,
    }

    impl LayoutGenerator for CornerLayout {
        fn generate(
            &self,
            words: Vec<WordClue>,
            size: u32,
        ) -> BoxFuture<'static, Result<Layout, LayoutError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let placements = words
                    .into_iter()
                    .take(2)
                    .zip([Direction::Across, Direction::Down])
                    .map(|(word, direction)| Placement {
                        answer: word.answer,
                        clue: word.clue,
                        row: 0,
                        col: 0,
                        direction,
                    })
                    .collect();
                Ok(Layout {
                    rows: size,
                    cols: size,
                    placements,
                })
            })
        }
    }

    struct FailingLayout;

    impl LayoutGenerator for FailingLayout {
        fn generate(
            &self,
            _words: Vec<WordClue>,
            _size: u32,
        ) -> BoxFuture<'static, Result<Layout, LayoutError>> {
            Box::pin(async { Err(LayoutError::NoLayout) })
        }
    }

    async fn state_with(layout: Arc<dyn LayoutGenerator>, words: &[(&str, &str)]) -> SharedState {
        let state = AppState::new(AppConfig::default(), layout);
        let store = MemoryPuzzleStore::new();
        if !words.is_empty() {
            store
                .save_word_set(WordSetEntity {
                    id: Uuid::new_v4(),
                    name: "Animals".into(),
                    weighting: 100,
                    words: words
                        .iter()
                        .map(|(word, clue)| WordEntity {
                            word: (*word).into(),
                            clue: (*clue).into(),
                        })
                        .collect(),
                })
                .await
                .unwrap();
        }
        state.set_store(Arc::new(store)).await;
        state
    }

    #[tokio::test]
    async fn generated_puzzles_are_owned_and_listed() {
        let layout = Arc::new(CornerLayout {
            calls: AtomicUsize::new(0),
        });
        let state = state_with(layout.clone(), &[("CAT", "Pet"), ("CAR", "Vehicle")]).await;

        let generated = generate(&state, "alice", 10).await.unwrap();
        assert_eq!(generated.size, Some(10));
        assert_eq!(generated.word_count, 2);
        assert_eq!(generated.percent_complete, 0);
        assert_eq!(layout.calls.load(Ordering::SeqCst), 1);

        let store = state.require_store().await.unwrap();
        let stored = store.find_puzzle(generated.id).await.unwrap().unwrap();
        assert_eq!(stored.owner_id.as_deref(), Some("alice"));
        assert!(stored.entries.iter().all(|entry| entry.number == 1));
        assert!(store.list_puzzles().await.unwrap().is_empty());

        assert_eq!(list_generated(&state, "alice").await.unwrap().len(), 1);
        assert!(list_generated(&state, "bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_reports_completion() {
        let layout = Arc::new(CornerLayout {
            calls: AtomicUsize::new(0),
        });
        let state = state_with(layout, &[("CAT", "Pet"), ("CAR", "Vehicle")]).await;
        let generated = generate(&state, "alice", 10).await.unwrap();

        session_service::open(&state, "alice", generated.id).await.unwrap();
        session_service::edit(
            &state,
            "alice",
            generated.id,
            CellEdit {
                row: 0,
                col: 0,
                letter: "C".into(),
            },
        )
        .unwrap();
        let listed = list_generated(&state, "alice").await.unwrap();
        assert_eq!(listed[0].percent_complete, 20);

        session_service::close(&state, "alice", generated.id).await.unwrap();
        let listed = list_generated(&state, "alice").await.unwrap();
        assert_eq!(listed[0].percent_complete, 20);
        assert!(listed[0].last_saved.is_some());
    }

    #[tokio::test]
    async fn unsupported_sizes_and_empty_selections_are_rejected() {
        let layout = Arc::new(CornerLayout {
            calls: AtomicUsize::new(0),
        });
        let state = state_with(layout.clone(), &[]).await;

        assert!(matches!(
            generate(&state, "alice", 11).await,
            Err(ServiceError::InvalidInput(_))
        ));
        match generate(&state, "alice", 10).await {
            Err(ServiceError::InvalidInput(message)) => assert_eq!(message, "no words available"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(layout.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn layout_failures_are_surfaced_without_storing() {
        let state = state_with(Arc::new(FailingLayout), &[("CAT", "Pet")]).await;
        assert!(matches!(
            generate(&state, "alice", 10).await,
            Err(ServiceError::GenerationFailed(_))
        ));
        assert!(list_generated(&state, "alice").await.unwrap().is_empty());
    }
}
