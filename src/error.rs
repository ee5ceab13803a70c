//! Error types for the registrations harmonizer.
//!
//! This module defines typed errors for the different stages of collection,
//! so the orchestrator can tell an expected gap (a month not yet published)
//! from a broken layout or an unwritable store.

use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// Zone registry lookup errors
    #[error("registry error")]
    Registry(#[from] RegistryError),

    /// Per-month collection errors
    #[error("collection error")]
    Collect(#[from] CollectError),

    /// Canonical store errors
    #[error("storage error")]
    Storage(#[from] StorageError),

    /// Generic errors that don't fit other categories
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Zone registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The requested zone code is not configured
    #[error("unknown zone '{code}', available zones: {}", available.join(", "))]
    UnknownZone { code: String, available: Vec<String> },
}

/// Errors raised while collecting one month for one country.
///
/// None of these abort the run: the orchestrator logs them and moves on to the
/// next month.
#[derive(Error, Debug)]
pub enum CollectError {
    /// Every URL candidate for the period failed
    #[error("no document found after trying {} candidate(s): {}", candidates.len(), candidates.join(", "))]
    NotFound { candidates: Vec<String> },

    /// Expected header, row or dimension metadata is absent
    #[error("unexpected document structure: {0}")]
    ParseStructure(String),

    /// Fewer data points than the minimum layout needs
    #[error("insufficient data: found {found} value(s), need at least {required}")]
    InsufficientData { found: usize, required: usize },

    /// The target country does not appear in a multi-country document
    #[error("country '{country}' not found in document")]
    CountryNotFound { country: String },

    /// Connection reset, timeout and similar
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    /// The record could not be persisted
    #[error("storage failure")]
    Storage(#[from] StorageError),
}

/// Failure of a single HTTP exchange.
///
/// The fetcher folds these into [`CollectError`] once every candidate or the
/// single retry is exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Candidate URL could not be parsed
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Connection reset, timeout or interrupted body
    #[error("request to {url} failed: {source}")]
    Transient {
        url: String,
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Redirect response without a usable Location header
    #[error("{0} redirected without a usable location")]
    MissingLocation(String),

    /// Redirect chain longer than the configured bound
    #[error("too many redirects starting from {0}")]
    TooManyRedirects(String),
}

/// Canonical store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Directory could not be created
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    /// File could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// A record for this month is already persisted
    #[error("record already exists at {path}")]
    AlreadyExists { path: String },

    /// Record (de)serialization failed
    #[error("invalid record at {path}: {source}")]
    Serialization {
        path: String,
        source: serde_json::Error,
    },

    /// Records without entries are never persisted
    #[error("refusing to persist empty record for {0}")]
    EmptyRecord(String),
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl CollectError {
    /// Creates a not-found error from the candidates that were tried.
    pub fn not_found<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotFound {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::ParseStructure(message.into())
    }

    /// Creates a country-not-found error.
    pub fn country_not_found(country: impl Into<String>) -> Self {
        Self::CountryNotFound {
            country: country.into(),
        }
    }
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// URL the failed exchange was addressed to.
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. } | Self::Transient { url, .. } | Self::Status { url, .. } => {
                url
            }
            Self::MissingLocation(url) | Self::TooManyRedirects(url) => url,
        }
    }
}

impl From<FetchError> for CollectError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl { .. } => Self::ParseStructure(err.to_string()),
            FetchError::Transient { .. } => Self::TransientNetwork(err.to_string()),
            other => Self::not_found([other.url().to_string()]),
        }
    }
}

impl From<reqwest::Error> for CollectError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseStructure(err.to_string())
        } else {
            Self::TransientNetwork(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CollectError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseStructure(err.to_string())
    }
}

impl StorageError {
    /// Creates a directory creation error.
    pub fn create_dir(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error.
    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
