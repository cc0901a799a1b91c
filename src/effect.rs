//! Cancellable, lazily-started units of asynchronous work.
//!
//! An [`Effect`] describes work that emits zero or more values and then
//! completes. Nothing runs until the effect is consumed with
//! [`Effect::into_stream`] (or a convenience like [`Effect::collect`]), and
//! dropping the running stream cancels everything the effect owns: in-flight
//! futures, timers, channel subscriptions. Because running an effect consumes
//! it, the underlying work can never execute more than once per effect value.
//!
//! Effects have no error channel. Fallible work carries a `Result` in its
//! output type; effects that structurally cannot fail are therefore
//! statically infallible.
//!
//! # Examples
//!
//! ```rust
//! use headway::Effect;
//!
//! # tokio_test::block_on(async {
//! let effect = Effect::value(1).concat(Effect::value(2)).map(|x| x * 10);
//! assert_eq!(effect.collect().await, vec![10, 20]);
//! # });
//! ```
//!
//! The [`Effect::emitter`] constructor is the escape hatch for work that
//! interleaves emission with awaiting, such as a state machine reporting
//! progress:
//!
//! ```rust
//! use headway::Effect;
//!
//! # tokio_test::block_on(async {
//! let effect = Effect::emitter(|emitter| async move {
//!     emitter.emit("started");
//!     // ... await something ...
//!     emitter.emit("finished");
//! });
//! assert_eq!(effect.collect().await, vec!["started", "finished"]);
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, Stream, StreamExt};

type MakeStream<T> = Box<dyn FnOnce() -> BoxStream<'static, T> + Send>;

/// A lazily-started, cancellable unit of asynchronous work emitting zero or
/// more values of type `T`.
pub struct Effect<T> {
    make: MakeStream<T>,
}

// Manual Debug implementation since the inner closure is not Debug.
impl<T> std::fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("make", &"<stream>").finish()
    }
}

impl<T: Send + 'static> Effect<T> {
    /// An effect that emits nothing and completes immediately.
    pub fn none() -> Self {
        Effect {
            make: Box::new(|| stream::empty().boxed()),
        }
    }

    /// An effect that emits `value` and completes.
    ///
    /// ```rust
    /// use headway::Effect;
    ///
    /// # tokio_test::block_on(async {
    /// assert_eq!(Effect::value(42).collect().await, vec![42]);
    /// # });
    /// ```
    pub fn value(value: T) -> Self {
        Effect {
            make: Box::new(move || stream::once(async move { value }).boxed()),
        }
    }

    /// An effect that runs `work` for its side effect and emits nothing.
    ///
    /// `work` does not run until the effect itself runs.
    pub fn fire_and_forget<F>(work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Effect {
            make: Box::new(move || {
                stream::once(async move { work() })
                    .filter_map(|()| futures::future::ready(None::<T>))
                    .boxed()
            }),
        }
    }

    /// An effect that runs `work` and emits its result.
    pub fn from_fn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Effect {
            make: Box::new(move || stream::once(async move { work() }).boxed()),
        }
    }

    /// An effect that awaits `work` and emits its output.
    ///
    /// ```rust
    /// use headway::Effect;
    ///
    /// # tokio_test::block_on(async {
    /// let effect = Effect::deferred(async { 2 + 2 });
    /// assert_eq!(effect.collect().await, vec![4]);
    /// # });
    /// ```
    pub fn deferred<Fut>(work: Fut) -> Self
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        Effect {
            make: Box::new(move || stream::once(work).boxed()),
        }
    }

    /// An effect that emits every item of `stream`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Effect {
            make: Box::new(move || stream.boxed()),
        }
    }

    /// An effect driven by an async block that pushes values through an
    /// [`Emitter`].
    ///
    /// Values emitted before a suspension point are delivered before the
    /// effect's completion, in emission order. Dropping the running stream
    /// drops the driver future, cancelling whatever it was awaiting; no value
    /// is observable after that.
    pub fn emitter<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Effect {
            make: Box::new(move || {
                let (tx, rx) = mpsc::unbounded();
                let driver = f(Emitter { tx });
                Driven {
                    driver: Some(Box::pin(driver) as BoxFuture<'static, ()>),
                    values: rx,
                }
                .boxed()
            }),
        }
    }

    /// Transform every emitted value.
    pub fn map<U, F>(self, f: F) -> Effect<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        Effect {
            make: Box::new(move || (self.make)().map(f).boxed()),
        }
    }

    /// Replace every emitted value with the output of a new effect.
    ///
    /// Inner effects run one at a time, in order.
    pub fn flat_map<U, F>(self, mut f: F) -> Effect<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Effect<U> + Send + 'static,
    {
        Effect {
            make: Box::new(move || {
                (self.make)()
                    .map(move |value| f(value).into_stream())
                    .flatten()
                    .boxed()
            }),
        }
    }

    /// Run `self` to completion, then run `other`.
    ///
    /// `other` is not started until `self` has completed.
    ///
    /// ```rust
    /// use headway::Effect;
    ///
    /// # tokio_test::block_on(async {
    /// let effect = Effect::value("a").concat(Effect::value("b"));
    /// assert_eq!(effect.collect().await, vec!["a", "b"]);
    /// # });
    /// ```
    pub fn concat(self, other: Effect<T>) -> Self {
        Effect {
            make: Box::new(move || {
                let second =
                    stream::once(futures::future::ready(other)).flat_map(Effect::into_stream);
                (self.make)().chain(second).boxed()
            }),
        }
    }

    /// Start the effect's work and return its output stream.
    ///
    /// Dropping the stream cancels the work.
    pub fn into_stream(self) -> BoxStream<'static, T> {
        (self.make)()
    }

    /// Run the effect to completion and gather every emitted value.
    pub async fn collect(self) -> Vec<T> {
        self.into_stream().collect().await
    }
}

/// Push side of an [`Effect::emitter`] effect.
///
/// Emitters may be cloned and moved into concurrent work; the effect's
/// stream stays open until the driver has finished and every emitter clone
/// is gone.
pub struct Emitter<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Emitter<T> {
    /// Emit a value to the effect's subscriber.
    ///
    /// Emitting after the subscriber has gone away is a no-op.
    pub fn emit(&self, value: T) {
        let _ = self.tx.unbounded_send(value);
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Emitter {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

/// Stream that interleaves driving the emitter future with draining its
/// emitted values, keeping emissions ordered ahead of completion.
struct Driven<T> {
    driver: Option<BoxFuture<'static, ()>>,
    values: mpsc::UnboundedReceiver<T>,
}

impl<T> Stream for Driven<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = &mut *self;
        loop {
            if let Poll::Ready(item) = Pin::new(&mut this.values).poll_next(cx) {
                return Poll::Ready(item);
            }
            match this.driver.as_mut() {
                Some(driver) => match driver.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        // Drops the driver and with it the primary sender;
                        // the next channel poll drains stragglers then ends.
                        this.driver = None;
                    }
                    Poll::Pending => {
                        // The driver may have emitted while it ran.
                        return Pin::new(&mut this.values).poll_next(cx);
                    }
                },
                // Emitter clones moved into spawned work keep the channel
                // open past the driver's completion.
                None => return Poll::Pending,
            }
        }
    }
}
