use thiserror::Error;

/// Errors surfaced to the controller's error policy.
///
/// Remediation failures never show up here: the tracker logs them and moves
/// on.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
