//! Response classification contract.
//!
//! The coordinator is generic over *how* a raw outcome maps to "done",
//! "give up" or "try again": each request type supplies a
//! [`ResponseClassifier`]. The bundled [`StatusClassifier`] implements the
//! typical policy — transport failures and 5xx responses are worth retrying,
//! well-formed application-level rejections are not.

use crate::http::{HttpFailure, RawOutcome, ResponseData};

/// Verdict of classifying a raw outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classified<T, E> {
    /// The request succeeded; stop.
    Success(T),
    /// The request failed and must not be retried.
    Terminal(E),
    /// The request failed but another attempt may succeed.
    Retriable(E),
}

/// Per-request-type policy turning a raw network outcome into a verdict.
pub trait ResponseClassifier: Send + Sync {
    /// Parsed success value.
    type Success: Send;
    /// Classified error value.
    type Error: Clone + Send;

    /// Classify one raw outcome.
    fn classify(&self, outcome: RawOutcome) -> Classified<Self::Success, Self::Error>;
}

/// Error produced by [`StatusClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpError {
    /// The request never reached a well-formed response.
    Transport(HttpFailure),
    /// The server answered with a non-success status.
    Status(u16),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Transport(failure) => write!(f, "{}", failure),
            HttpError::Status(code) => write!(f, "server returned status {}", code),
        }
    }
}

impl std::error::Error for HttpError {}

/// Status-code driven policy: 2xx is success, 5xx and transport failures are
/// retriable, everything else is terminal.
///
/// # Examples
///
/// ```rust
/// use headway::http::ResponseData;
/// use headway::request::{Classified, ResponseClassifier, StatusClassifier};
///
/// let classifier = StatusClassifier;
/// let verdict = classifier.classify(Ok(ResponseData::new(503, vec![])));
/// assert!(matches!(verdict, Classified::Retriable(_)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl ResponseClassifier for StatusClassifier {
    type Success = ResponseData;
    type Error = HttpError;

    fn classify(&self, outcome: RawOutcome) -> Classified<ResponseData, HttpError> {
        match outcome {
            Err(failure) => Classified::Retriable(HttpError::Transport(failure)),
            Ok(response) => match response.metadata.status {
                200..=299 => Classified::Success(response),
                500..=599 => Classified::Retriable(HttpError::Status(response.metadata.status)),
                code => Classified::Terminal(HttpError::Status(code)),
            },
        }
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;
    use crate::http::HttpFailureKind;
    use proptest::prelude::*;

    #[test]
    fn test_transport_failures_are_retriable() {
        let verdict = StatusClassifier.classify(Err(HttpFailure::new(HttpFailureKind::Timeout)));
        assert!(matches!(
            verdict,
            Classified::Retriable(HttpError::Transport(_))
        ));
    }

    #[test]
    fn test_success_carries_response() {
        let verdict = StatusClassifier.classify(Ok(ResponseData::new(200, b"ok".to_vec())));
        match verdict {
            Classified::Success(response) => assert_eq!(response.body, b"ok".to_vec()),
            other => panic!("expected success, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_status_policy(status in 100u16..600) {
            let verdict = StatusClassifier.classify(Ok(ResponseData::new(status, vec![])));
            match status {
                200..=299 => prop_assert!(matches!(verdict, Classified::Success(_))),
                500..=599 => prop_assert!(
                    matches!(verdict, Classified::Retriable(HttpError::Status(c)) if c == status)
                ),
                _ => prop_assert!(
                    matches!(verdict, Classified::Terminal(HttpError::Status(c)) if c == status)
                ),
            }
        }
    }
}
