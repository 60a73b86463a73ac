use engagement::EngagementError;
use thiserror::Error;

/// Errors surfaced by the engagement service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engagement(#[from] EngagementError),

    #[error("Derivation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Engagement(e) if e.is_not_found())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ServiceError::Engagement(EngagementError::InvalidArgument(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
