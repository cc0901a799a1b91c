//! Connectivity-gated request coordination.

use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};

use crate::clock::Clock;
use crate::effect::{Effect, Emitter};
use crate::error::ErrorEvent;
use crate::http::{HttpExecutor, HttpFailure, HttpFailureKind, RawOutcome, RequestDescriptor};
use crate::request::classify::{Classified, ResponseClassifier};
use crate::request::result::{RequestResult, RetryCondition};
use crate::transport::{TransportError, TransportStatus};

/// Retry budget applied when none is configured.
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Backoff interval applied when none is configured.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Drives one logical request against an intermittently-available transport.
///
/// An invocation is a state machine: it waits for the transport to become
/// ready (unbounded, uncounted), executes the request, classifies the
/// outcome via the configured [`ResponseClassifier`], and either stops or
/// retries after the configured interval. Progress is observable: the
/// returned effect emits a [`RequestResult::WillRetry`] for every retry
/// decision, then exactly one terminal event — unless the transport never
/// becomes ready, in which case it emits `WillRetry` events indefinitely and
/// the caller's own timeout or cancellation is expected to end it. There is
/// deliberately no internal cap on transport waiting.
///
/// If the transport stops being ready while a request is in flight, the
/// attempt is cancelled and does not count against the retry budget; only
/// attempts that produced a retriably-classified outcome do. When a produced
/// outcome and a not-ready observation race, the not-ready observation wins
/// and the outcome is discarded — the server may still have processed the
/// request, so descriptors must be safe to execute more than once.
///
/// # Examples
///
/// ```rust,no_run
/// use headway::clock::SystemClock;
/// use headway::http::RequestDescriptor;
/// use headway::request::{RetriableRequest, StatusClassifier};
/// use std::time::Duration;
///
/// # fn streams() -> (futures::stream::BoxStream<'static, headway::transport::TransportStatus>,
/// #                  futures::stream::BoxStream<'static, Option<u32>>) { unimplemented!() }
/// # fn executor() -> headway::testing::ScriptedExecutor { unimplemented!() }
/// let request = RetriableRequest::new(
///     RequestDescriptor::json("https://api.example.com/verify", b"{}".to_vec()),
///     StatusClassifier,
/// )
/// .with_retry_count(3)
/// .with_retry_interval(Duration::from_secs(2));
///
/// let (status, handles) = streams();
/// let effect = request.invoke(SystemClock, status, handles, executor());
/// // subscribe to `effect` and consume RequestResult events
/// ```
#[derive(Debug, Clone)]
pub struct RetriableRequest<C> {
    descriptor: RequestDescriptor,
    classifier: C,
    retry_count: u32,
    retry_interval: Duration,
}

impl<C> RetriableRequest<C> {
    /// Coordinate `descriptor` under `classifier` with the default retry
    /// budget and interval.
    pub fn new(descriptor: RequestDescriptor, classifier: C) -> Self {
        Self {
            descriptor,
            classifier,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Set how many retriably-failed attempts may be retried.
    ///
    /// The budget counts only attempts whose outcome was classified
    /// retriable; transport waiting is never counted.
    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set the backoff delay between retriably-failed attempts.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// The configured retry budget.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The configured backoff interval.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }
}

impl<C> RetriableRequest<C>
where
    C: ResponseClassifier + 'static,
{
    /// Start coordinating: returns a lazy effect emitting the invocation's
    /// [`RequestResult`] sequence.
    ///
    /// `status` and `handles` are expected to replay their latest value to
    /// the new subscriber (a watch channel does). Dropping the running
    /// effect unsubscribes from both streams, cancels any in-flight request
    /// and pending backoff timer, and emits nothing further.
    pub fn invoke<H, K, X>(
        self,
        clock: K,
        status: BoxStream<'static, TransportStatus>,
        handles: BoxStream<'static, Option<H>>,
        executor: X,
    ) -> Effect<RequestResult<C::Success, C::Error>>
    where
        H: Clone + Send + 'static,
        K: Clock + 'static,
        X: HttpExecutor<H> + 'static,
    {
        Effect::emitter(move |emitter| run(self, clock, status, handles, executor, emitter))
    }
}

/// Whether a request may be issued, given the latest observation from each
/// source. `None` until both sources have delivered at least once.
fn admit<H>(
    status: Option<TransportStatus>,
    handle: &Option<Option<H>>,
) -> Option<Result<(), TransportError>> {
    let status = status?;
    let handle = handle.as_ref()?;
    Some(match (status, handle) {
        (TransportStatus::Ready, Some(_)) => Ok(()),
        (TransportStatus::NoHandle, _) | (_, None) => Err(TransportError::NoHandle),
        _ => Err(TransportError::NotReady),
    })
}

async fn run<C, H, K, X>(
    request: RetriableRequest<C>,
    clock: K,
    status: BoxStream<'static, TransportStatus>,
    handles: BoxStream<'static, Option<H>>,
    executor: X,
    emitter: Emitter<RequestResult<C::Success, C::Error>>,
) where
    C: ResponseClassifier + 'static,
    H: Clone + Send + 'static,
    K: Clock + 'static,
    X: HttpExecutor<H> + 'static,
{
    let mut status = status.fuse();
    let mut handles = handles.fuse();
    let mut status_open = true;
    let mut handles_open = true;

    // Latest observation from each source; the outer Option tracks whether
    // the source has delivered at all, so nothing is emitted against a
    // half-seen pair.
    let mut current_status: Option<TransportStatus> = None;
    let mut current_handle: Option<Option<H>> = None;

    let mut remaining = request.retry_count;

    'attempts: loop {
        // Awaiting transport: emit one WillRetry per observed event that
        // leaves the transport unusable. Unbounded, uncounted.
        while !matches!(admit(current_status, &current_handle), Some(Ok(()))) {
            if !status_open && !handles_open {
                // No further transport observation can arrive; end without a
                // terminal, mirroring the input signals' own completion.
                tracing::debug!("transport sources ended while waiting");
                return;
            }
            tokio::select! {
                event = status.next(), if status_open => match event {
                    Some(observed) => current_status = Some(observed),
                    None => {
                        status_open = false;
                        continue;
                    }
                },
                event = handles.next(), if handles_open => match event {
                    Some(observed) => current_handle = Some(observed),
                    None => {
                        handles_open = false;
                        continue;
                    }
                },
            }
            if let Some(Err(error)) = admit(current_status, &current_handle) {
                tracing::debug!(%error, "transport unusable, waiting");
                emitter.emit(RequestResult::WillRetry(RetryCondition::WhenResolved(error)));
            }
        }

        let handle = match current_handle.as_ref().and_then(|h| h.as_ref()) {
            Some(handle) => handle.clone(),
            None => continue 'attempts,
        };

        // In flight: race the attempt against the transport observations.
        // The select is biased so a not-ready observation in the same tick
        // as a produced outcome wins: never trust a possibly stale handle.
        tracing::debug!(url = request.descriptor.url(), "attempting request");
        let mut outcomes = executor.execute(handle, &request.descriptor).into_stream().fuse();
        let raw: RawOutcome = loop {
            tokio::select! {
                biased;

                event = status.next(), if status_open => match event {
                    Some(observed) => {
                        if current_status == Some(observed) {
                            continue;
                        }
                        current_status = Some(observed);
                        if let Some(Err(error)) = admit(current_status, &current_handle) {
                            tracing::debug!(%error, "transport lost in flight, attempt dropped");
                            emitter.emit(RequestResult::WillRetry(
                                RetryCondition::WhenResolved(error),
                            ));
                            continue 'attempts;
                        }
                    }
                    None => status_open = false,
                },
                event = handles.next(), if handles_open => match event {
                    Some(observed) => {
                        current_handle = Some(observed);
                        match admit(current_status, &current_handle) {
                            Some(Err(error)) => {
                                tracing::debug!(%error, "handle lost in flight, attempt dropped");
                                emitter.emit(RequestResult::WillRetry(
                                    RetryCondition::WhenResolved(error),
                                ));
                            }
                            // A fresh handle mid-flight restarts the attempt
                            // silently; the old handle may be stale.
                            _ => tracing::debug!("handle replaced in flight, attempt restarted"),
                        }
                        continue 'attempts;
                    }
                    None => handles_open = false,
                },
                outcome = outcomes.next() => match outcome {
                    Some(raw) => break raw,
                    // Executor stopped without producing an outcome.
                    None => break Err(HttpFailure::new(HttpFailureKind::Interrupted)),
                },
            }
        };
        drop(outcomes);

        match request.classifier.classify(raw) {
            Classified::Success(value) => {
                tracing::debug!("request completed");
                emitter.emit(RequestResult::Completed(value));
                return;
            }
            Classified::Terminal(error) => {
                tracing::debug!("request rejected, not retriable");
                emitter.emit(RequestResult::Failed(ErrorEvent::new(error, clock.now())));
                return;
            }
            Classified::Retriable(error) => {
                if remaining == 0 {
                    tracing::debug!("retry budget exhausted");
                    emitter.emit(RequestResult::Failed(ErrorEvent::new(error, clock.now())));
                    return;
                }
                remaining -= 1;
                tracing::debug!(remaining, "retrying after backoff");
                emitter.emit(RequestResult::WillRetry(RetryCondition::AfterInterval {
                    interval: request.retry_interval,
                    result: error,
                }));
                tokio::time::sleep(request.retry_interval).await;
            }
        }
    }
}
