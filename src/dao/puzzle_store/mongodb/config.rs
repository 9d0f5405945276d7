//! Connection settings of the MongoDB backend.

use std::env;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DB: &str = "crossword";

/// Parsed client options plus the database holding the crossword collections.
#[derive(Clone)]
pub struct MongoConfig {
    options: ClientOptions,
    database_name: String,
}

impl MongoConfig {
    /// Parse `uri`; `database_name` defaults to `crossword`.
    pub async fn from_uri(uri: &str, database_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        Ok(Self {
            options,
            database_name: database_name.unwrap_or(DEFAULT_DB).to_owned(),
        })
    }

    /// Read `MONGO_URI` (defaulting to a local server) and the optional `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.into());
        let database_name = env::var("MONGO_DB").ok();
        Self::from_uri(&uri, database_name.as_deref()).await
    }

    /// Build a client and ping the database once. Retries belong to the storage supervisor.
    pub(super) async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::ConnectPing {
                database: self.database_name.clone(),
                source,
            })?;
        Ok((client, database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_defaults_to_crossword() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", None)
            .await
            .unwrap();
        assert_eq!(config.database_name, DEFAULT_DB);

        let named = MongoConfig::from_uri("mongodb://localhost:27017", Some("puzzles"))
            .await
            .unwrap();
        assert_eq!(named.database_name, "puzzles");
    }

    #[tokio::test]
    async fn malformed_uris_are_rejected() {
        let result = MongoConfig::from_uri("postgres://localhost", None).await;
        assert!(matches!(result, Err(MongoDaoError::InvalidUri { .. })));
    }
}
