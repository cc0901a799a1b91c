//! Connectivity-aware retriable requests.
//!
//! This module coordinates one logical HTTP request against a transport that
//! comes and goes: the request is only attempted while the transport is
//! usable, attempts interrupted by connectivity loss are dropped without
//! consuming the retry budget, and retriably-classified failures are retried
//! after a backoff, up to a configured count.
//!
//! The moving parts:
//!
//! - [`RetriableRequest`] — the coordinator: builder plus
//!   [`invoke`](RetriableRequest::invoke), which returns a lazy
//!   [`Effect`](crate::Effect) emitting the invocation's progress.
//! - [`RequestResult`] / [`RetryCondition`] — the observable output
//!   sequence: zero or more `WillRetry` events, then at most one terminal.
//! - [`ResponseClassifier`] / [`Classified`] — the per-request-type policy
//!   deciding whether an outcome is done, terminal, or worth retrying.
//!   [`StatusClassifier`] is the bundled status-code policy.

mod classify;
mod coordinator;
mod result;

pub use classify::{Classified, HttpError, ResponseClassifier, StatusClassifier};
pub use coordinator::{RetriableRequest, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_INTERVAL};
pub use result::{RequestResult, RetryCondition};
