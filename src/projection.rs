//! Derived read/write views of a store.
//!
//! A [`Projection`] narrows a parent [`Store`](crate::Store) (or another
//! projection) to a local value and action type. It is a pure view plus a
//! pure write translation: reads recompute the mapped value from the parent
//! on every access, writes translate the local action and forward it to the
//! parent's dispatch, and updates are the parent's publications mapped
//! one-to-one — no caching, no extra buffering, no reordering.
//!
//! # Examples
//!
//! ```rust
//! use headway::{Reducer, Store};
//! use futures::StreamExt;
//!
//! #[derive(Clone)]
//! struct App { count: i64, name: String }
//!
//! enum AppAction { Add(i64) }
//!
//! # tokio_test::block_on(async {
//! let reducer = Reducer::new(|state: &mut App, AppAction::Add(n), _env: &()| {
//!     state.count += n;
//!     vec![]
//! });
//! let store = Store::new(App { count: 0, name: "app".into() }, reducer, ());
//!
//! // A counter-shaped view: local value i64, local action i64.
//! let counter = store.projection(|app: App| app.count, AppAction::Add);
//! let mut updates = counter.updates();
//! assert_eq!(updates.next().await, Some(0));
//!
//! counter.send(3);
//! assert_eq!(updates.next().await, Some(3));
//! assert_eq!(counter.value(), 3);
//! # });
//! ```

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};

type ReadFn<S> = Arc<dyn Fn() -> S + Send + Sync>;
type WriteFn<A> = Arc<dyn Fn(A) + Send + Sync>;
type ObserveFn<S> = Arc<dyn Fn() -> BoxStream<'static, S> + Send + Sync>;

/// A read/write view over a parent store with mapped value and action types.
pub struct Projection<S, A> {
    read: ReadFn<S>,
    write: WriteFn<A>,
    observe: ObserveFn<S>,
}

impl<S, A> Clone for Projection<S, A> {
    fn clone(&self) -> Self {
        Projection {
            read: self.read.clone(),
            write: self.write.clone(),
            observe: self.observe.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for Projection<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection").finish_non_exhaustive()
    }
}

impl<S, A> Projection<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn from_parts(read: ReadFn<S>, write: WriteFn<A>, observe: ObserveFn<S>) -> Self {
        Projection {
            read,
            write,
            observe,
        }
    }

    /// The mapped value, recomputed from the parent's current state.
    pub fn value(&self) -> S {
        (self.read)()
    }

    /// Translate `action` and dispatch it through the parent.
    pub fn send(&self, action: A) {
        (self.write)(action)
    }

    /// Every parent publication mapped to the local value, in order,
    /// starting with the current one.
    pub fn updates(&self) -> BoxStream<'static, S> {
        (self.observe)()
    }

    /// Derive a further projection; views compose.
    pub fn projection<LS, LA, VF, AF>(&self, value: VF, action: AF) -> Projection<LS, LA>
    where
        LS: Send + 'static,
        LA: Send + 'static,
        VF: Fn(S) -> LS + Send + Sync + Clone + 'static,
        AF: Fn(LA) -> A + Send + Sync + 'static,
    {
        let read = {
            let parent = self.clone();
            let value = value.clone();
            move || value(parent.value())
        };
        let write = {
            let parent = self.clone();
            move |local: LA| parent.send(action(local))
        };
        let observe = {
            let parent = self.clone();
            move || {
                let value = value.clone();
                parent.updates().map(move |state| value(state)).boxed()
            }
        };
        Projection::from_parts(Arc::new(read), Arc::new(write), Arc::new(observe))
    }
}
