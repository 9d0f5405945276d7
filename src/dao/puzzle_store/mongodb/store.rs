//! MongoDB implementation of the puzzle store.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoProgressDocument, MongoPuzzleDocument, MongoPuzzleListDocument, MongoUserDocument,
        MongoWordSetDocument, doc_id, puzzle_list_projection,
    },
};
use crate::dao::{
    models::{
        ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity, WordSetEntity,
        progress_record_key,
    },
    puzzle_store::PuzzleStore,
    storage::StorageResult,
};

const PUZZLE_COLLECTION_NAME: &str = "puzzles";
const WORD_SET_COLLECTION_NAME: &str = "word_sets";
const PROGRESS_COLLECTION_NAME: &str = "progress";
const USER_COLLECTION_NAME: &str = "users";

/// [`PuzzleStore`] backed by MongoDB, one collection per entity.
#[derive(Clone)]
pub struct MongoPuzzleStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPuzzleStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let puzzles = database.collection::<mongodb::bson::Document>(PUZZLE_COLLECTION_NAME);
        for (field, name) in [("title", "puzzle_title_idx"), ("owner_id", "puzzle_owner_idx")] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();
            puzzles
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: PUZZLE_COLLECTION_NAME,
                    index: name,
                    source,
                })?;
        }

        // The `_id` already encodes the pair; the unique index guards writers that bypass it.
        let progress = database.collection::<mongodb::bson::Document>(PROGRESS_COLLECTION_NAME);
        let progress_index = IndexModel::builder()
            .keys(doc! {"user_id": 1, "puzzle_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("progress_user_puzzle_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        progress
            .create_index(progress_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PROGRESS_COLLECTION_NAME,
                index: "user_id,puzzle_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn puzzle_collection(&self) -> Collection<MongoPuzzleDocument> {
        self.database()
            .await
            .collection::<MongoPuzzleDocument>(PUZZLE_COLLECTION_NAME)
    }

    async fn word_set_collection(&self) -> Collection<MongoWordSetDocument> {
        self.database()
            .await
            .collection::<MongoWordSetDocument>(WORD_SET_COLLECTION_NAME)
    }

    async fn progress_collection(&self) -> Collection<MongoProgressDocument> {
        self.database()
            .await
            .collection::<MongoProgressDocument>(PROGRESS_COLLECTION_NAME)
    }

    async fn user_collection(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn save_puzzle(&self, puzzle: PuzzleEntity) -> MongoResult<()> {
        let id = puzzle.id.to_string();
        let document: MongoPuzzleDocument = puzzle.into();
        self.puzzle_collection()
            .await
            .replace_one(doc_id(id.clone()), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PUZZLE_COLLECTION_NAME,
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_puzzle(&self, id: Uuid) -> MongoResult<Option<PuzzleEntity>> {
        let document = self
            .puzzle_collection()
            .await
            .find_one(doc_id(id.to_string()))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PUZZLE_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn list_puzzles(&self) -> MongoResult<Vec<PuzzleListItemEntity>> {
        let collection = self
            .puzzle_collection()
            .await
            .clone_with_type::<MongoPuzzleListDocument>();

        let documents: Vec<MongoPuzzleListDocument> = collection
            .find(doc! { "owner_id": null })
            .projection(puzzle_list_projection())
            .sort(doc! { "title": 1 })
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PUZZLE_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PUZZLE_COLLECTION_NAME,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_owned_puzzles(&self, owner_id: String) -> MongoResult<Vec<PuzzleEntity>> {
        let documents: Vec<MongoPuzzleDocument> = self
            .puzzle_collection()
            .await
            .find(doc! { "owner_id": owner_id })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PUZZLE_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PUZZLE_COLLECTION_NAME,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_word_set(&self, word_set: WordSetEntity) -> MongoResult<()> {
        let id = word_set.id.to_string();
        let document: MongoWordSetDocument = word_set.into();
        self.word_set_collection()
            .await
            .replace_one(doc_id(id.clone()), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: WORD_SET_COLLECTION_NAME,
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_word_set(&self, id: Uuid) -> MongoResult<Option<WordSetEntity>> {
        let document = self
            .word_set_collection()
            .await
            .find_one(doc_id(id.to_string()))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: WORD_SET_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn list_word_sets(&self) -> MongoResult<Vec<WordSetEntity>> {
        let documents: Vec<MongoWordSetDocument> = self
            .word_set_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: WORD_SET_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: WORD_SET_COLLECTION_NAME,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_word_set(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .word_set_collection()
            .await
            .delete_one(doc_id(id.to_string()))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: WORD_SET_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn save_progress(&self, progress: ProgressEntity) -> MongoResult<()> {
        let key = progress.record_key();
        let document: MongoProgressDocument = progress.into();
        self.progress_collection()
            .await
            .replace_one(doc_id(key.clone()), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PROGRESS_COLLECTION_NAME,
                id: key,
                source,
            })?;
        Ok(())
    }

    async fn find_progress(
        &self,
        user_id: String,
        puzzle_id: Uuid,
    ) -> MongoResult<Option<ProgressEntity>> {
        let key = progress_record_key(&user_id, puzzle_id);
        let document = self
            .progress_collection()
            .await
            .find_one(doc_id(key.clone()))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PROGRESS_COLLECTION_NAME,
                id: key,
                source,
            })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn list_progress(&self, user_id: String) -> MongoResult<Vec<ProgressEntity>> {
        let documents: Vec<MongoProgressDocument> = self
            .progress_collection()
            .await
            .find(doc! { "user_id": user_id })
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PROGRESS_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PROGRESS_COLLECTION_NAME,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_user(&self, uid: String) -> MongoResult<Option<UserEntity>> {
        let document = self
            .user_collection()
            .await
            .find_one(doc_id(uid.clone()))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: USER_COLLECTION_NAME,
                id: uid,
                source,
            })?;
        Ok(document.map(Into::into))
    }
}

impl PuzzleStore for MongoPuzzleStore {
    fn save_puzzle(&self, puzzle: PuzzleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_puzzle(puzzle).await.map_err(Into::into) })
    }

    fn find_puzzle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_puzzle(id).await.map_err(Into::into) })
    }

    fn list_puzzles(&self) -> BoxFuture<'static, StorageResult<Vec<PuzzleListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_puzzles().await.map_err(Into::into) })
    }

    fn list_owned_puzzles(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_owned_puzzles(owner_id).await.map_err(Into::into) })
    }

    fn save_word_set(&self, word_set: WordSetEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_word_set(word_set).await.map_err(Into::into) })
    }

    fn find_word_set(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_word_set(id).await.map_err(Into::into) })
    }

    fn list_word_sets(&self) -> BoxFuture<'static, StorageResult<Vec<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_word_sets().await.map_err(Into::into) })
    }

    fn delete_word_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_word_set(id).await.map_err(Into::into) })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_progress(progress).await.map_err(Into::into) })
    }

    fn find_progress(
        &self,
        user_id: String,
        puzzle_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_progress(user_id, puzzle_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_progress(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_progress(user_id).await.map_err(Into::into) })
    }

    fn find_user(&self, uid: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(uid).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
