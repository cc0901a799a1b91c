//! Test doubles for transport signals and request execution.
//!
//! These are ordinary library types (not `cfg(test)`) so downstream crates
//! can drive a coordinator deterministically in their own tests: push
//! transport observations with [`FakeTransport`], script network outcomes
//! with [`ScriptedExecutor`], and stall an attempt indefinitely with
//! [`StalledExecutor`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};

use crate::effect::Effect;
use crate::http::{HttpExecutor, HttpFailure, HttpFailureKind, RawOutcome, RequestDescriptor};
use crate::transport::TransportStatus;

/// An in-memory transport signal source.
///
/// Events pushed before the streams are consumed are queued and delivered in
/// order, so a test can script an entire connectivity timeline up front.
/// Dropping the `FakeTransport` ends both streams.
///
/// # Examples
///
/// ```rust
/// use headway::testing::FakeTransport;
/// use headway::transport::TransportStatus;
///
/// let transport: FakeTransport<&str> = FakeTransport::new();
/// transport.push_status(TransportStatus::Ready);
/// transport.push_handle(Some("tunnel-1"));
/// let status = transport.status_stream();
/// let handles = transport.handle_stream();
/// # let _ = (status, handles);
/// ```
pub struct FakeTransport<H> {
    status_tx: mpsc::UnboundedSender<TransportStatus>,
    handle_tx: mpsc::UnboundedSender<Option<H>>,
    status_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportStatus>>>,
    handle_rx: Mutex<Option<mpsc::UnboundedReceiver<Option<H>>>>,
}

impl<H> std::fmt::Debug for FakeTransport<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}

impl<H: Send + 'static> Default for FakeTransport<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Send + 'static> FakeTransport<H> {
    /// A transport with no queued observations.
    pub fn new() -> Self {
        let (status_tx, status_rx) = mpsc::unbounded();
        let (handle_tx, handle_rx) = mpsc::unbounded();
        Self {
            status_tx,
            handle_tx,
            status_rx: Mutex::new(Some(status_rx)),
            handle_rx: Mutex::new(Some(handle_rx)),
        }
    }

    /// Queue a status observation.
    pub fn push_status(&self, status: TransportStatus) {
        let _ = self.status_tx.unbounded_send(status);
    }

    /// Queue a handle observation. `None` means no handle is available.
    pub fn push_handle(&self, handle: Option<H>) {
        let _ = self.handle_tx.unbounded_send(handle);
    }

    /// The status observation stream.
    ///
    /// # Panics
    ///
    /// Panics if called more than once; there is a single consumer.
    pub fn status_stream(&self) -> BoxStream<'static, TransportStatus> {
        self.status_rx
            .lock()
            .expect("status receiver lock poisoned")
            .take()
            .expect("status stream already taken")
            .boxed()
    }

    /// The handle observation stream.
    ///
    /// # Panics
    ///
    /// Panics if called more than once; there is a single consumer.
    pub fn handle_stream(&self) -> BoxStream<'static, Option<H>> {
        self.handle_rx
            .lock()
            .expect("handle receiver lock poisoned")
            .take()
            .expect("handle stream already taken")
            .boxed()
    }
}

/// An executor that replays a fixed script of outcomes.
///
/// Each *run* of a returned effect consumes the next scripted outcome and
/// increments the run count; an effect that is never run consumes nothing.
/// When the script is exhausted the fallback outcome (if any) is repeated,
/// otherwise the effect reports an interrupted request.
///
/// # Examples
///
/// ```rust
/// use headway::http::{HttpFailure, HttpFailureKind, ResponseData};
/// use headway::testing::ScriptedExecutor;
///
/// let executor = ScriptedExecutor::new(vec![
///     Err(HttpFailure::new(HttpFailureKind::Io)),
///     Ok(ResponseData::new(200, b"ok".to_vec())),
/// ]);
/// assert_eq!(executor.runs(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<VecDeque<RawOutcome>>>,
    fallback: Option<RawOutcome>,
    runs: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    /// Replay `outcomes` in order, one per executed attempt.
    pub fn new(outcomes: impl IntoIterator<Item = RawOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            fallback: None,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Produce `outcome` for every attempt.
    pub fn always(outcome: RawOutcome) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Some(outcome),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many attempts have actually run.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl<H: Send + 'static> HttpExecutor<H> for ScriptedExecutor {
    fn execute(&self, _handle: H, _request: &RequestDescriptor) -> Effect<RawOutcome> {
        let script = self.script.clone();
        let fallback = self.fallback.clone();
        let runs = self.runs.clone();
        Effect::from_fn(move || {
            runs.fetch_add(1, Ordering::SeqCst);
            let next = script.lock().expect("script lock poisoned").pop_front();
            next.or(fallback)
                .unwrap_or(Err(HttpFailure::new(HttpFailureKind::Interrupted)))
        })
    }
}

/// An executor whose attempts start but never produce an outcome.
///
/// Each run is counted when the attempt starts, so a test can observe that an
/// attempt was in flight before it was cancelled.
#[derive(Debug, Clone, Default)]
pub struct StalledExecutor {
    runs: Arc<AtomicUsize>,
}

impl StalledExecutor {
    /// An executor with no runs yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many attempts have started.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl<H: Send + 'static> HttpExecutor<H> for StalledExecutor {
    fn execute(&self, _handle: H, _request: &RequestDescriptor) -> Effect<RawOutcome> {
        let runs = self.runs.clone();
        Effect::deferred(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().await
        })
    }
}

#[cfg(test)]
mod testing_tests {
    use super::*;
    use crate::http::{Method, ResponseData};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_fake_transport_replays_queued_events() {
        let transport: FakeTransport<u32> = FakeTransport::new();
        transport.push_status(TransportStatus::Connecting);
        transport.push_status(TransportStatus::Ready);
        let mut status = transport.status_stream();
        assert_eq!(status.next().await, Some(TransportStatus::Connecting));
        assert_eq!(status.next().await, Some(TransportStatus::Ready));
    }

    #[tokio::test]
    async fn test_fake_transport_default_behaves_like_new() {
        let transport: FakeTransport<u32> = FakeTransport::default();
        let mut status = transport.status_stream();
        transport.push_status(TransportStatus::Ready);
        assert_eq!(status.next().await, Some(TransportStatus::Ready));
    }

    #[tokio::test]
    async fn test_fake_transport_streams_end_on_drop() {
        let transport: FakeTransport<u32> = FakeTransport::new();
        let mut status = transport.status_stream();
        drop(transport);
        assert_eq!(status.next().await, None);
    }

    #[tokio::test]
    async fn test_scripted_executor_counts_runs_not_executes() {
        let executor = ScriptedExecutor::new(vec![Ok(ResponseData::new(200, vec![]))]);
        let request = RequestDescriptor::new(Method::Get, "https://example.com");
        let never_run = executor.execute(1u32, &request);
        drop(never_run);
        assert_eq!(executor.runs(), 0);

        let outcome = executor.execute(1u32, &request).collect().await;
        assert_eq!(executor.runs(), 1);
        assert_eq!(outcome, vec![Ok(ResponseData::new(200, vec![]))]);
    }

    #[tokio::test]
    async fn test_scripted_executor_exhaustion_is_interrupted() {
        let executor = ScriptedExecutor::new(vec![]);
        let request = RequestDescriptor::new(Method::Get, "https://example.com");
        let outcome = executor.execute(1u32, &request).collect().await;
        assert_eq!(
            outcome,
            vec![Err(HttpFailure::new(HttpFailureKind::Interrupted))]
        );
    }
}
