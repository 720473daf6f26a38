//! Error types shared by the inference engine and its storage backends.

/// Errors surfaced to callers of the verification service.
///
/// Validation variants are always returned before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PulseError {
    #[error("invalid vote value: {0}")]
    InvalidVote(String),

    #[error("invalid issue report: {0}")]
    InvalidReport(String),

    #[error("station {0} not found")]
    StationNotFound(i64),

    #[error("reporter {0} not found")]
    ReporterNotFound(i64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl PulseError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PulseError::InvalidVote(_)
                | PulseError::InvalidReport(_)
                | PulseError::StationNotFound(_)
                | PulseError::ReporterNotFound(_)
        )
    }
}

pub type PulseResult<T> = Result<T, PulseError>;
