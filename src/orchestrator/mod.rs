// Pipeline orchestrators
pub mod recognition;
pub mod recommendation;

pub use recognition::{RecognitionError, RecognitionOrchestrator};
pub use recommendation::RecommendationOrchestrator;

use crate::services::ArkError;

/// Whether a model-call failure is worth another attempt. An empty response
/// is a completed call, so retrying it only burns the budget.
pub(crate) fn is_retryable(error: &ArkError) -> bool {
    matches!(
        error,
        ArkError::Timeout | ArkError::Api { .. } | ArkError::RequestError(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_is_not_retryable() {
        assert!(is_retryable(&ArkError::Timeout));
        assert!(is_retryable(&ArkError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        }));
        assert!(!is_retryable(&ArkError::EmptyResponse));
    }
}
