// ABOUTME: Error type shared by all cloud capability traits.
// ABOUTME: Keeps the failing operation name so errors can be surfaced verbatim.

/// Errors from cloud service calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CloudError {
    #[error("{operation}: resource not found: {message}")]
    NotFound {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: resource already exists: {message}")]
    AlreadyExists {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: access denied: {message}")]
    AccessDenied {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: throttled: {message}")]
    Throttled {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
}

impl CloudError {
    /// Name of the API call that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            CloudError::NotFound { operation, .. }
            | CloudError::AlreadyExists { operation, .. }
            | CloudError::AccessDenied { operation, .. }
            | CloudError::Throttled { operation, .. }
            | CloudError::Service { operation, .. } => operation,
        }
    }
}
