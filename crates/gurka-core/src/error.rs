use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid product name: {0:?}")]
    InvalidProduct(String),

    /// The raw query and its escaped retry both failed to parse.
    #[error("Query syntax error in {query:?}: {message}")]
    QuerySyntax { query: String, message: String },

    #[error("Index unavailable at {}: {message}", path.display())]
    IndexUnavailable { path: PathBuf, message: String },

    #[error("Unreadable report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn query_syntax(query: &str, message: impl ToString) -> Self {
        Self::QuerySyntax { query: query.to_string(), message: message.to_string() }
    }

    pub fn index_unavailable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::IndexUnavailable { path: path.into(), message: message.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
