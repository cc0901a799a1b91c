//! Observable output of a coordinator invocation.

use std::time::Duration;

use crate::error::ErrorEvent;
use crate::transport::TransportError;

/// Why a retry is about to happen.
///
/// Retry conditions are part of the coordinator's observable output, not
/// hidden internal state: consumers typically log them or surface them as
/// progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RetryCondition<E> {
    /// The request cannot be attempted until the transport condition
    /// resolves. Waiting is unbounded and never counts against the retry
    /// budget.
    WhenResolved(TransportError),
    /// The last attempt failed retriably; the next attempt starts after
    /// `interval`.
    AfterInterval {
        /// Backoff delay before the next attempt.
        interval: Duration,
        /// The classified error of the attempt being retried.
        result: E,
    },
}

/// One event in the output sequence of a coordinator invocation.
///
/// The sequence is zero or more [`WillRetry`](RequestResult::WillRetry)
/// events followed by at most one terminal
/// [`Completed`](RequestResult::Completed) or
/// [`Failed`](RequestResult::Failed).
///
/// A `Failed` event carries the last classified error whether the request
/// was rejected terminally or simply exhausted its retry budget; the two are
/// deliberately not distinguished structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestResult<T, E> {
    /// The request will be retried once the condition allows.
    WillRetry(RetryCondition<E>),
    /// The request succeeded. Terminal.
    Completed(T),
    /// The request failed and will not be retried. Terminal.
    Failed(ErrorEvent<E>),
}

impl<T, E> RequestResult<T, E> {
    /// Whether this event ends the sequence.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestResult::WillRetry(_))
    }
}

#[cfg(test)]
mod result_tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn test_terminality() {
        let retry: RequestResult<(), &str> =
            RequestResult::WillRetry(RetryCondition::WhenResolved(TransportError::NoHandle));
        assert!(!retry.is_terminal());

        let completed: RequestResult<(), &str> = RequestResult::Completed(());
        assert!(completed.is_terminal());

        let failed: RequestResult<(), &str> =
            RequestResult::Failed(ErrorEvent::new("rejected", SystemTime::UNIX_EPOCH));
        assert!(failed.is_terminal());
    }
}
