//! Timestamped error values.
//!
//! Every failure surfaced by the request coordinator is paired with the time
//! it was observed, so consumers can log and order failures without reaching
//! for a wall clock themselves. The timestamp comes from the injected
//! [`Clock`](crate::clock::Clock), which keeps tests deterministic.

use std::time::SystemTime;

/// An error paired with the time it was observed.
///
/// `ErrorEvent` values compare equal only when both the error and the
/// timestamp match, which makes emitted event sequences directly assertable
/// in tests driven by a fixed clock.
///
/// # Examples
///
/// ```rust
/// use headway::ErrorEvent;
/// use std::time::SystemTime;
///
/// let at = SystemTime::UNIX_EPOCH;
/// let event = ErrorEvent::new("connection reset", at);
/// assert_eq!(event.error(), &"connection reset");
/// assert_eq!(event.occurred_at(), at);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorEvent<E> {
    error: E,
    occurred_at: SystemTime,
}

impl<E> ErrorEvent<E> {
    /// Create an event recording `error` as observed at `occurred_at`.
    pub fn new(error: E, occurred_at: SystemTime) -> Self {
        Self { error, occurred_at }
    }

    /// The recorded error.
    pub fn error(&self) -> &E {
        &self.error
    }

    /// When the error was observed.
    pub fn occurred_at(&self) -> SystemTime {
        self.occurred_at
    }

    /// Extract the error, discarding the timestamp.
    pub fn into_error(self) -> E {
        self.error
    }

    /// Transform the error while keeping the timestamp.
    ///
    /// ```rust
    /// use headway::ErrorEvent;
    /// use std::time::SystemTime;
    ///
    /// let event = ErrorEvent::new(404u16, SystemTime::UNIX_EPOCH);
    /// let event = event.map(|code| format!("status {}", code));
    /// assert_eq!(event.error(), &"status 404".to_string());
    /// ```
    pub fn map<B, F>(self, f: F) -> ErrorEvent<B>
    where
        F: FnOnce(E) -> B,
    {
        ErrorEvent {
            error: f(self.error),
            occurred_at: self.occurred_at,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for ErrorEvent<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {:?})", self.error, self.occurred_at)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ErrorEvent<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod error_event_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_map_preserves_timestamp() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(7);
        let event = ErrorEvent::new(500u16, at).map(|c| c + 1);
        assert_eq!(event.error(), &501);
        assert_eq!(event.occurred_at(), at);
    }

    #[test]
    fn test_equality_includes_timestamp() {
        let a = ErrorEvent::new("e", SystemTime::UNIX_EPOCH);
        let b = ErrorEvent::new("e", SystemTime::UNIX_EPOCH + Duration::from_secs(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_mentions_error() {
        let event = ErrorEvent::new("timed out", SystemTime::UNIX_EPOCH);
        assert!(format!("{}", event).contains("timed out"));
    }
}
