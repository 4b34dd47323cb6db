//! Where the initial comment collection comes from.
use std::path::PathBuf;

use async_trait::async_trait;
use comment_thread::Comment;
use thiserror::Error;
use tracing::{info, instrument};

pub mod fixture;

pub use fixture::FixtureSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed comments in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to fetch comments.")]
    Unavailable,
}

#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Comment>, SourceError>;
}

/// Comments stored as a JSON array with camelCase fields and RFC 3339 timestamps.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CommentSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<Comment>, SourceError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SourceError::Read {
                    path: self.path.clone(),
                    source,
                })?;
        let comments: Vec<Comment> =
            serde_json::from_str(&contents).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;
        info!(count = comments.len(), "Loaded comments from file");
        Ok(comments)
    }
}
