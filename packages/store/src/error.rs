//! Error types for document stores

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable for `{path}`: {message}")]
    Unavailable { path: String, message: String },

    #[error("IO error for `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error for `{path}`: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid document path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

impl StoreError {
    pub fn unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
