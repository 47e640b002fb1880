use crate::models::MatchStatus;
use crate::services::store::StoreError;
use thiserror::Error;

/// Errors surfaced by registry, match and welfare operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not found: {resource} with id '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A status change outside `pending -> accepted | rejected`
    #[error("Invalid transition: match is {from}, cannot become {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("Data access failed: {0}")]
    DataAccess(#[from] StoreError),
}

impl CoreError {
    pub fn not_found(resource: &'static str, id: &str) -> Self {
        CoreError::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
