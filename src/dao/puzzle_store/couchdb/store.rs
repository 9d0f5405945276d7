//! CouchDB implementation of the puzzle store.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use uuid::Uuid;

use crate::dao::{
    models::{
        ProgressEntity, PuzzleEntity, PuzzleListItemEntity, UserEntity, WordSetEntity,
    },
    puzzle_store::PuzzleStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchProgressDocument, CouchPuzzleDocument, CouchRevision,
        CouchUserDocument, CouchWordSetDocument, END_SUFFIX, PROGRESS_PREFIX, PUZZLE_PREFIX,
        WORD_SET_PREFIX, progress_doc_id, puzzle_doc_id, user_doc_id, word_set_doc_id,
    },
};

/// [`PuzzleStore`] backed by one CouchDB database. Documents are told apart by id prefix.
#[derive(Clone)]
pub struct CouchPuzzleStore {
    client: Client,
    config: Arc<CouchConfig>,
}

impl CouchPuzzleStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;
        let store = Self {
            client,
            config: Arc::new(config),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.credentials() {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn database_name(&self) -> String {
        self.config
            .database_url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_owned()
    }

    /// Request against `doc_id`, escaped as one path segment.
    fn request(&self, method: Method, doc_id: &str) -> CouchResult<RequestBuilder> {
        let url = self.config.document_url(doc_id)?;
        Ok(self.authorize(self.client.request(method, url)))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database_name();
        let url = self.config.database_url().clone();

        let response = self
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)?
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn current_rev(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<CouchRevision>(doc_id)
            .await?
            .map(|doc| doc.rev))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)?
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(rev) = self.current_rev(doc_id).await? else {
            return Ok(false);
        };

        let response = self
            .request(Method::DELETE, doc_id)?
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = prefix_range(prefix);

        let response = self
            .request(Method::GET, ALL_DOCS)?
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })
            })
            .collect()
    }

    async fn list_puzzle_documents(&self) -> CouchResult<Vec<CouchPuzzleDocument>> {
        self.list_documents::<CouchPuzzleDocument>(PUZZLE_PREFIX)
            .await
    }
}

impl PuzzleStore for CouchPuzzleStore {
    fn save_puzzle(&self, puzzle: PuzzleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = puzzle_doc_id(puzzle.id);
            let rev = store.current_rev(&doc_id).await?;
            let doc = CouchPuzzleDocument::from((puzzle, rev));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn find_puzzle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = puzzle_doc_id(id);
            let maybe_doc = store.get_document::<CouchPuzzleDocument>(&doc_id).await?;
            Ok(maybe_doc.map(PuzzleEntity::try_from).transpose()?)
        })
    }

    fn list_puzzles(&self) -> BoxFuture<'static, StorageResult<Vec<PuzzleListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.list_puzzle_documents().await?;
            docs.into_iter()
                .filter(|doc| doc.puzzle.owner_id.is_none())
                .map(|doc| PuzzleListItemEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn list_owned_puzzles(
        &self,
        owner_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PuzzleEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.list_puzzle_documents().await?;
            docs.into_iter()
                .filter(|doc| doc.puzzle.owner_id.as_deref() == Some(owner_id.as_str()))
                .map(|doc| PuzzleEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn save_word_set(&self, word_set: WordSetEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = word_set_doc_id(word_set.id);
            let rev = store.current_rev(&doc_id).await?;
            let doc = CouchWordSetDocument::from((word_set, rev));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn find_word_set(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = word_set_doc_id(id);
            let maybe_doc = store.get_document::<CouchWordSetDocument>(&doc_id).await?;
            Ok(maybe_doc.map(WordSetEntity::try_from).transpose()?)
        })
    }

    fn list_word_sets(&self) -> BoxFuture<'static, StorageResult<Vec<WordSetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchWordSetDocument>(WORD_SET_PREFIX)
                .await?;
            docs.into_iter()
                .map(|doc| WordSetEntity::try_from(doc).map_err(Into::into))
                .collect()
        })
    }

    fn delete_word_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_document(&word_set_doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = progress_doc_id(&progress.user_id, progress.puzzle_id);
            let rev = store.current_rev(&doc_id).await?;
            let doc = CouchProgressDocument::from((progress, rev));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn find_progress(
        &self,
        user_id: String,
        puzzle_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = progress_doc_id(&user_id, puzzle_id);
            let maybe_doc = store.get_document::<CouchProgressDocument>(&doc_id).await?;
            Ok(maybe_doc.map(Into::into))
        })
    }

    fn list_progress(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            // The key prefix narrows the scan; user ids sharing a prefix are filtered out below.
            let prefix = format!("{PROGRESS_PREFIX}{user_id}_");
            let docs = store
                .list_documents::<CouchProgressDocument>(&prefix)
                .await?;
            Ok(docs
                .into_iter()
                .filter(|doc| doc.user_id == user_id)
                .map(Into::into)
                .collect())
        })
    }

    fn find_user(&self, uid: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchUserDocument>(&user_doc_id(&uid))
                .await?;
            Ok(maybe_doc.map(Into::into))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.config.database_url().clone();
            let response = store
                .authorize(store.client.get(url.clone()))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

/// `_all_docs` query selecting every id starting with `prefix`. Keys are JSON strings, so
/// quotes and backslashes in user ids are escaped.
fn prefix_range(prefix: &str) -> [(&'static str, String); 3] {
    [
        ("include_docs", "true".to_owned()),
        ("startkey", Value::from(prefix).to_string()),
        ("endkey", Value::from(format!("{prefix}{END_SUFFIX}")).to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_range_keys_are_json_strings() {
        let [_, (_, start), (_, end)] = prefix_range("progress::a\"b_");
        assert_eq!(start, r#""progress::a\"b_""#);
        assert_eq!(
            serde_json::from_str::<String>(&end).unwrap(),
            format!("progress::a\"b_{END_SUFFIX}")
        );
    }
}
