use thiserror::Error;

use crate::{attachment::AttachmentError, source::SourceError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error("error sending message on channel")]
    TokioMpsc,
    #[error(transparent)]
    InitLoggingError(#[from] tracing_subscriber::util::TryInitError),
    #[error(transparent)]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("error setting global {0}")]
    ErrorSettingGlobal(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::TokioMpsc
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
