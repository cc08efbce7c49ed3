use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("github error: {0}")]
    GitHub(String),

    #[error("github returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("problem creating pull request (status {status}): {body}")]
    PrCreation { status: u16, body: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("cannot fast-forward {0}")]
    NotFastForward(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("run aborted by operator")]
    Aborted,
}

impl SweepError {
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => SweepError::Api {
                status: source.status_code.as_u16(),
                message: source.message.clone(),
            },
            other => SweepError::GitHub(other.to_string()),
        }
    }

    /// HTTP status of an API failure, if the error came from GitHub.
    pub fn status(&self) -> Option<u16> {
        match self {
            SweepError::Api { status, .. } | SweepError::PrCreation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
