//! # Headway
//!
//! > *Making progress against the current.*
//!
//! A Rust library for reactive state management and connectivity-aware
//! request coordination.
//!
//! ## Philosophy
//!
//! **Headway** keeps the pure and the effectful apart:
//! - **State** changes only inside pure reducers, one action at a time.
//! - **Effects** are lazy, cancellable descriptions of asynchronous work;
//!   nothing runs until something subscribes.
//!
//! On top of that core sits a request coordinator for transports that come
//! and go: a request is only attempted while the transport is usable,
//! interrupted attempts are retried without consuming the retry budget, and
//! every retry decision is observable.
//!
//! ## Quick Example
//!
//! ```rust
//! use headway::{Effect, Reducer, Store};
//! use futures::StreamExt;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter { count: i64 }
//!
//! enum Action {
//!     Increment,
//!     Reset,
//! }
//!
//! # tokio_test::block_on(async {
//! let reducer = Reducer::new(|state: &mut Counter, action: Action, _env: &()| {
//!     match action {
//!         Action::Increment => state.count += 1,
//!         Action::Reset => state.count = 0,
//!     }
//!     vec![]
//! });
//!
//! let store = Store::new(Counter { count: 0 }, reducer, ());
//! let mut updates = store.updates();
//! assert_eq!(updates.next().await, Some(Counter { count: 0 }));
//!
//! store.send(Action::Increment);
//! assert_eq!(updates.next().await, Some(Counter { count: 1 }));
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`effect`] — lazy, cancellable streams of values.
//! - [`store`] — single-writer state container with reducer composition.
//! - [`projection`] — derived read/write views of a store.
//! - [`request`] — the connectivity-gated retriable request coordinator.
//! - [`http`] — the transport-agnostic request/response model.
//! - [`transport`] — transport readiness observations and errors.
//! - [`clock`] / [`error`] — injected time and timestamped errors.
//! - [`testing`] — deterministic doubles for transport and execution.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod clock;
pub mod effect;
pub mod error;
pub mod http;
pub mod projection;
pub mod request;
pub mod store;
pub mod testing;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use effect::{Effect, Emitter};
pub use error::ErrorEvent;
pub use projection::Projection;
pub use request::{RequestResult, RetriableRequest, RetryCondition};
pub use store::{Reducer, Store};
pub use transport::{TransportError, TransportStatus};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::effect::{Effect, Emitter};
    pub use crate::error::ErrorEvent;
    pub use crate::http::{HttpExecutor, RawOutcome, RequestDescriptor, ResponseData};
    pub use crate::projection::Projection;
    pub use crate::request::{
        Classified, RequestResult, ResponseClassifier, RetriableRequest, RetryCondition,
        StatusClassifier,
    };
    pub use crate::store::{Reducer, Store};
    pub use crate::transport::{TransportError, TransportStatus};
}
