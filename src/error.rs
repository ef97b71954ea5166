use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },

    #[error("could not decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("could not start background worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("background worker stopped")]
    WorkerGone,
}

impl Error {
    /// Short text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            Error::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                "City not found.".to_string()
            }
            Error::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                "Request rejected. Check your API key.".to_string()
            }
            Error::Http(_) => "Network error. Check your connection.".to_string(),
            other => other.to_string(),
        }
    }
}
