use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a live source could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquireFailure {
    PermissionDenied,
    NotFound,
    ConstraintUnsatisfiable,
    Unknown,
}

impl fmt::Display for AcquireFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AcquireFailure::PermissionDenied => "permission-denied",
            AcquireFailure::NotFound => "not-found",
            AcquireFailure::ConstraintUnsatisfiable => "constraint-unsatisfiable",
            AcquireFailure::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Error)]
#[error("source acquisition failed ({reason}): {detail}")]
pub struct AcquireError {
    pub reason: AcquireFailure,
    pub detail: String,
}

impl AcquireError {
    pub fn new(reason: AcquireFailure, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self::new(AcquireFailure::PermissionDenied, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(AcquireFailure::NotFound, detail)
    }

    pub fn constraint(detail: impl Into<String>) -> Self {
        Self::new(AcquireFailure::ConstraintUnsatisfiable, detail)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("capture is not recording")]
    NotRecording,
    #[error(transparent)]
    Acquire(#[from] AcquireError),
}

impl SessionError {
    pub fn acquire_reason(&self) -> Option<AcquireFailure> {
        match self {
            SessionError::Acquire(err) => Some(err.reason),
            SessionError::NotRecording => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("api key missing: environment variable '{var}' is not set")]
    MissingApiKey { var: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("answering service returned {code}: {body}")]
    Status { code: u16, body: String },
    #[error("failed to decode answer: {0}")]
    Decode(String),
    #[error("answer contained no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}")]
    Message { message: String },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConfigError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Context {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
