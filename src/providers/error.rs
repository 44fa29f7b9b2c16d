//! Provider error types

use thiserror::Error;

/// Failure reported by a platform provider (permissions, GPS, compass)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The underlying sensor or service does not exist on this device
    #[error("{provider} is unavailable: {reason}")]
    Unavailable { provider: String, reason: String },
    /// The platform reported an error while servicing the request
    #[error("{provider} failed: {reason}")]
    Failed { provider: String, reason: String },
    /// A lazy sequence finished before yielding the requested element
    #[error("{provider} stream ended before producing a value")]
    StreamEnded { provider: String },
}

impl ProviderError {
    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::Failed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
