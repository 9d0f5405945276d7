//! Error types shared by the CouchDB storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required connection setting is absent from the environment.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The base URL cannot address documents.
    #[error("invalid CouchDB URL `{url}`: {reason}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Checking for the database failed before CouchDB answered.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        /// Database name.
        database: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// Creating the missing database failed before CouchDB answered.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Database name.
        database: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered a database request with an unexpected status.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Document id or endpoint.
        path: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered a document endpoint with an unexpected status (including 409 conflicts).
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Document id or endpoint.
        path: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// The response body was not the expected JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Document id or endpoint.
        path: String,
        /// Decoding error.
        #[source]
        source: reqwest::Error,
    },
    /// A row of `_all_docs` did not match the document shape.
    #[error("failed to deserialize CouchDB value for `{path}`")]
    DeserializeValue {
        /// Endpoint the row came from.
        path: String,
        /// Deserialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// A stored document id does not carry the expected prefix and UUID.
    #[error("invalid document ID `{doc_id}`: {kind}")]
    InvalidDocId {
        /// Offending id.
        doc_id: String,
        /// What is wrong with it.
        kind: &'static str,
    },
}
