use thiserror::Error;

use crate::types::Step;

/// Failure talking to the company directory. Never surfaces past the
/// enrichment coordinator; it is logged and folded into "not found".
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("decode: {0}")]
    Decode(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Backend {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Decode(e.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(e.to_string())
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Failure of the final submission sink.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("submission sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    #[error("cannot {action} while in {step}")]
    InvalidTransition { step: Step, action: &'static str },

    #[error("a {0} transition is already in flight")]
    InFlight(&'static str),

    #[error("stale ticket for {0} transition")]
    StaleTicket(&'static str),

    #[error("missing required fields: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("submission failed: {0}")]
    SubmissionFailed(#[from] SubmitError),
}

impl SessionError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidEmail(_) => 400,
            Self::InvalidTransition { .. } => 409,
            Self::InFlight(_) => 409,
            Self::StaleTicket(_) => 409,
            Self::Incomplete { .. } => 422,
            Self::SubmissionFailed(_) => 502,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}
