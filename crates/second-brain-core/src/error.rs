//! Error taxonomy for the capture and retrieval pipelines.
//!
//! Errors are raised where they are detected and propagate unchanged to
//! the request boundary, which maps each variant to a client-visible status.

use thiserror::Error;

/// Failure reported by an AI provider adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Quota exhaustion, auth failure, outage, timeout, or network error.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered but the body could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("AI service unavailable or quota exceeded: {0}")]
    ProviderUnavailable(String),

    #[error("malformed AI provider response: {0}")]
    MalformedProviderResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    #[error("failed to write knowledge item: {0}")]
    StoreWrite(String),

    #[error("failed to read knowledge items: {0}")]
    StoreRead(String),
}

impl BrainError {
    /// True for failures caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BrainError::Unauthenticated(_) | BrainError::InvalidInput(_)
        )
    }

    /// True when the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrainError::ProviderUnavailable(_))
    }

    /// Map a store failure; a `BrainError` raised inside the store passes through.
    pub(crate) fn store_write(err: anyhow::Error) -> Self {
        match err.downcast::<BrainError>() {
            Ok(inner) => inner,
            Err(err) => BrainError::StoreWrite(format!("{err:#}")),
        }
    }

    pub(crate) fn store_read(err: anyhow::Error) -> Self {
        match err.downcast::<BrainError>() {
            Ok(inner) => inner,
            Err(err) => BrainError::StoreRead(format!("{err:#}")),
        }
    }
}

impl From<ProviderError> for BrainError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => BrainError::ProviderUnavailable(msg),
            ProviderError::Malformed(msg) => BrainError::MalformedProviderResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_mapping() {
        let err: BrainError = ProviderError::Unavailable("429 quota".into()).into();
        assert!(matches!(err, BrainError::ProviderUnavailable(_)));
        assert!(err.is_retryable());

        let err: BrainError = ProviderError::Malformed("no candidates".into()).into();
        assert!(matches!(err, BrainError::MalformedProviderResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_client_errors() {
        assert!(BrainError::Unauthenticated("x".into()).is_client_error());
        assert!(BrainError::InvalidInput("x".into()).is_client_error());
        assert!(!BrainError::EmbeddingDimensionMismatch {
            expected: 768,
            actual: 512
        }
        .is_client_error());
    }

    #[test]
    fn test_store_errors_keep_typed_cause() {
        let err = BrainError::store_write(anyhow::Error::from(
            BrainError::EmbeddingDimensionMismatch {
                expected: 8,
                actual: 4,
            },
        ));
        assert!(matches!(
            err,
            BrainError::EmbeddingDimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));

        let err = BrainError::store_read(anyhow::anyhow!("disk I/O error"));
        assert!(matches!(err, BrainError::StoreRead(ref m) if m.contains("disk I/O")));
    }

    #[test]
    fn test_mismatch_message() {
        let err = BrainError::EmbeddingDimensionMismatch {
            expected: 768,
            actual: 512,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 768, got 512"
        );
    }
}
