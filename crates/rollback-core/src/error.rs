use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("invalid revert mode '{0}': expected 'live' or 'echo'")]
    InvalidRevertMode(String),

    #[error("GitLab API returned {status}: {body}")]
    GitLabApi { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RollbackError>;
