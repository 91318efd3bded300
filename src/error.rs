use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Anything that reaches this type aborts the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error on '{}': {source}", .path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single input line was skipped.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("missing value for field '{0}'")]
    MissingField(&'static str),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("malformed line: {0}")]
    Csv(String),
}

/// Why a parsed transaction failed validation.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("unknown region")]
    UnknownRegion,
}

/// Catalog retrieval failure. The pipeline degrades on this instead of aborting.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog API responded with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("catalog JSON could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("catalog pagination did not terminate after {0} pages")]
    TooManyPages(usize),

    #[error("catalog fetch disabled (offline mode)")]
    Offline,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid setting: {message}")]
    Invalid { message: String },
}
