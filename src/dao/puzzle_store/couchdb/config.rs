//! Connection settings of the CouchDB backend.

use std::env;

use reqwest::Url;

use super::error::{CouchDaoError, CouchResult};

/// Where the CouchDB database lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    database_url: Url,
    credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Validate `base_url` and append `database` as one escaped path segment.
    pub fn new(base_url: &str, database: &str) -> CouchResult<Self> {
        let base = Url::parse(base_url).map_err(|err| CouchDaoError::InvalidUrl {
            url: base_url.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            database_url: push_segment(&base, database)?,
            credentials: None,
        })
    }

    /// Authenticate every request with basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB` and, when both are set, `COUCH_USERNAME` and
    /// `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = required_var("COUCH_BASE_URL")?;
        let database = required_var("COUCH_DB")?;
        let config = Self::new(&base_url, &database)?;
        Ok(
            match (env::var("COUCH_USERNAME").ok(), env::var("COUCH_PASSWORD").ok()) {
                (Some(username), Some(password)) => config.with_credentials(username, password),
                _ => config,
            },
        )
    }

    /// URL of the database itself.
    pub fn database_url(&self) -> &Url {
        &self.database_url
    }

    /// Basic-auth user and password, when configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }

    /// URL of `doc_id` inside the database. The id is percent-encoded as a single path
    /// segment, so `/`, `?` and `#` in user ids stay part of the id.
    pub fn document_url(&self, doc_id: &str) -> CouchResult<Url> {
        push_segment(&self.database_url, doc_id)
    }
}

fn required_var(var: &'static str) -> CouchResult<String> {
    env::var(var).map_err(|_| CouchDaoError::MissingEnvVar { var })
}

fn push_segment(base: &Url, segment: &str) -> CouchResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CouchDaoError::InvalidUrl {
            url: base.to_string(),
            reason: "cannot be a base URL".into(),
        })?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}
