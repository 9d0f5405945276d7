//! Error types of the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised while talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// `MONGO_URI` could not be parsed into client options.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Parser error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The first ping after connecting failed.
    #[error("could not reach MongoDB database `{database}`")]
    ConnectPing {
        /// Database name.
        database: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An upsert failed.
    #[error("failed to write `{id}` into `{collection}`")]
    Write {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A lookup by id failed.
    #[error("failed to read `{id}` from `{collection}`")]
    Read {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A delete failed.
    #[error("failed to delete `{id}` from `{collection}`")]
    Delete {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A listing query or its cursor failed.
    #[error("failed to list `{collection}`")]
    List {
        /// Collection name.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document cannot be mapped back to an entity.
    #[error("stored document `{id}` is invalid: {reason}")]
    CorruptedDocument {
        /// Document id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}
