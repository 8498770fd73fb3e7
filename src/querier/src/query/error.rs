use super::backend::BackendError;
use super::promql::PromQLError;

/// Coarse outcome class an HTTP layer maps to a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Unauthorized,
    BadRequest,
    Unprocessable,
    Internal,
}

/// Errors terminating a discovery request
#[derive(Debug, thiserror::Error)]
pub enum QuerierError {
    #[error("please provide a READ token")]
    AuthMissing,
    #[error("{source}")]
    MatcherSyntax {
        #[source]
        source: PromQLError,
        category: StatusCategory,
    },
    #[error("{message}")]
    Validation {
        message: String,
        category: StatusCategory,
    },
    /// The backend message is kept as the source only, never displayed
    #[error("internal server error while searching for series")]
    Backend {
        selector: String,
        #[source]
        source: BackendError,
    },
}

impl QuerierError {
    pub fn syntax(source: PromQLError, category: StatusCategory) -> Self {
        Self::MatcherSyntax { source, category }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            category: StatusCategory::BadRequest,
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            category: StatusCategory::Unprocessable,
        }
    }

    pub fn status_category(&self) -> StatusCategory {
        match self {
            Self::AuthMissing => StatusCategory::Unauthorized,
            Self::MatcherSyntax { category, .. } | Self::Validation { category, .. } => *category,
            Self::Backend { .. } => StatusCategory::Internal,
        }
    }
}
