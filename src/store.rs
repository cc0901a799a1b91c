//! Single-writer state container.
//!
//! A [`Store`] pairs one state value with one [`Reducer`] and serializes
//! every mutation through a dedicated driver task: no two reducer invocations
//! for the same store ever overlap, no matter how many threads call
//! [`Store::send`]. The reducer returns [`Effect`]s, which the store runs
//! outside the critical section; actions an effect emits are fed back through
//! the same channel as external sends, so an effect can never re-enter the
//! reducer synchronously.
//!
//! Observers see state publications in the exact order dispatches were
//! accepted. Dropping the last handle to a store aborts its driver and every
//! outstanding effect.
//!
//! # Examples
//!
//! ```rust
//! use headway::{Effect, Reducer, Store};
//! use futures::StreamExt;
//!
//! #[derive(Clone)]
//! struct Counter { count: i64 }
//!
//! enum Action { Add(i64) }
//!
//! # tokio_test::block_on(async {
//! let reducer = Reducer::new(|state: &mut Counter, action, _env: &()| {
//!     match action {
//!         Action::Add(n) => state.count += n,
//!     }
//!     vec![]
//! });
//!
//! let store = Store::new(Counter { count: 0 }, reducer, ());
//! let mut updates = store.updates();
//! assert_eq!(updates.next().await.unwrap().count, 0); // replay of current
//!
//! store.send(Action::Add(2));
//! assert_eq!(updates.next().await.unwrap().count, 2);
//! # });
//! ```

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::effect::Effect;
use crate::projection::Projection;

/// A pure state-transition function: mutates the state for one action and
/// returns the effects to schedule.
///
/// Reducers must not block and must not perform I/O; all I/O belongs in the
/// returned effects.
pub struct Reducer<S, A, E> {
    reduce: Arc<dyn Fn(&mut S, A, &E) -> Vec<Effect<A>> + Send + Sync>,
}

impl<S, A, E> Clone for Reducer<S, A, E> {
    fn clone(&self) -> Self {
        Reducer {
            reduce: self.reduce.clone(),
        }
    }
}

impl<S, A, E> std::fmt::Debug for Reducer<S, A, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer").finish_non_exhaustive()
    }
}

impl<S, A, E> Reducer<S, A, E>
where
    S: 'static,
    A: Send + 'static,
    E: 'static,
{
    /// Wrap a reducer function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut S, A, &E) -> Vec<Effect<A>> + Send + Sync + 'static,
    {
        Reducer { reduce: Arc::new(f) }
    }

    /// Apply the reducer to `state` for `action`.
    pub fn reduce(&self, state: &mut S, action: A, environment: &E) -> Vec<Effect<A>> {
        (self.reduce)(state, action, environment)
    }

    /// Run several reducers over the same state and action, concatenating
    /// their effects in order.
    pub fn combine(reducers: impl IntoIterator<Item = Self>) -> Self
    where
        A: Clone,
    {
        let reducers: Vec<Self> = reducers.into_iter().collect();
        Reducer::new(move |state, action: A, environment| {
            reducers
                .iter()
                .flat_map(|reducer| reducer.reduce(state, action.clone(), environment))
                .collect()
        })
    }

    /// Embed a local reducer into a global one.
    ///
    /// `value` focuses the global state on the local state, `action` extracts
    /// the local action from a global one (returning `None` for actions this
    /// reducer does not handle), `embed` maps effect outputs back into global
    /// actions, and `environment` derives the local environment.
    ///
    /// ```rust
    /// use headway::{Effect, Reducer};
    ///
    /// #[derive(Clone)]
    /// struct App { count: i64 }
    ///
    /// #[derive(Clone)]
    /// enum AppAction { Counter(i64), Other }
    ///
    /// let counter = Reducer::new(|count: &mut i64, add: i64, _env: &()| {
    ///     *count += add;
    ///     vec![]
    /// });
    ///
    /// let app = counter.pull_back(
    ///     |app: &mut App| &mut app.count,
    ///     |action: &AppAction| match action {
    ///         AppAction::Counter(n) => Some(*n),
    ///         AppAction::Other => None,
    ///     },
    ///     AppAction::Counter,
    ///     |_env: &()| (),
    /// );
    ///
    /// let mut state = App { count: 1 };
    /// app.reduce(&mut state, AppAction::Counter(2), &());
    /// assert_eq!(state.count, 3);
    /// ```
    pub fn pull_back<GS, GA, GE, VF, AF, MF, EF>(
        self,
        value: VF,
        action: AF,
        embed: MF,
        environment: EF,
    ) -> Reducer<GS, GA, GE>
    where
        GS: 'static,
        GA: Send + 'static,
        GE: 'static,
        VF: Fn(&mut GS) -> &mut S + Send + Sync + 'static,
        AF: Fn(&GA) -> Option<A> + Send + Sync + 'static,
        MF: Fn(A) -> GA + Send + Sync + Clone + 'static,
        EF: Fn(&GE) -> E + Send + Sync + 'static,
    {
        Reducer::new(move |global_state, global_action: GA, global_env| {
            let Some(local_action) = action(&global_action) else {
                return Vec::new();
            };
            let local_env = environment(global_env);
            let effects = self.reduce(value(global_state), local_action, &local_env);
            effects
                .into_iter()
                .map(|effect| {
                    let embed = embed.clone();
                    effect.map(move |local| embed(local))
                })
                .collect()
        })
    }
}

enum StoreMsg<S, A> {
    Action(A),
    Subscribe(mpsc::UnboundedSender<S>),
}

/// Aborts the driver task once the last store handle is gone.
#[derive(Debug)]
struct DriverGuard(tokio::task::JoinHandle<()>);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A single-writer container of application state.
///
/// Handles are cheap to clone; all clones address the same state. The store
/// must be created inside a Tokio runtime, which hosts its driver task.
pub struct Store<S, A> {
    messages: mpsc::UnboundedSender<StoreMsg<S, A>>,
    current: watch::Receiver<S>,
    _driver: Arc<DriverGuard>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Store {
            messages: self.messages.clone(),
            current: self.current.clone(),
            _driver: self._driver.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a store owning `initial` state, driven by `reducer` with
    /// `environment` available to every reducer invocation.
    pub fn new<E>(initial: S, reducer: Reducer<S, A, E>, environment: E) -> Self
    where
        E: Send + 'static,
    {
        let (messages, inbox) = mpsc::unbounded_channel();
        let (current_tx, current) = watch::channel(initial.clone());
        let feedback = messages.clone();
        let driver = tokio::spawn(drive(
            initial,
            reducer,
            environment,
            inbox,
            current_tx,
            feedback,
        ));
        Store {
            messages,
            current,
            _driver: Arc::new(DriverGuard(driver)),
        }
    }

    /// Dispatch an action.
    ///
    /// Thread-safe; actions are applied in the order they are accepted.
    /// Actions sent after the store has been torn down are dropped.
    pub fn send(&self, action: A) {
        if self.messages.send(StoreMsg::Action(action)).is_err() {
            tracing::debug!("action dropped, store driver is gone");
        }
    }

    /// The current state.
    pub fn value(&self) -> S {
        self.current.borrow().clone()
    }

    /// Every published state, in publication order, starting with the
    /// current one (replay-latest).
    pub fn updates(&self) -> BoxStream<'static, S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.messages.send(StoreMsg::Subscribe(tx));
        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|state| (state, rx))
        })
        .boxed()
    }

    /// Derive a read/write view with mapped value and action types.
    ///
    /// The projection performs no effect scheduling and no reducer logic of
    /// its own: reads recompute `value(parent.value())` every time, and
    /// writes forward `action` through the parent's dispatch.
    pub fn projection<LS, LA, VF, AF>(&self, value: VF, action: AF) -> Projection<LS, LA>
    where
        LS: Send + 'static,
        LA: Send + 'static,
        VF: Fn(S) -> LS + Send + Sync + Clone + 'static,
        AF: Fn(LA) -> A + Send + Sync + 'static,
    {
        let read = {
            let store = self.clone();
            let value = value.clone();
            move || value(store.value())
        };
        let write = {
            let store = self.clone();
            move |local: LA| store.send(action(local))
        };
        let observe = {
            let store = self.clone();
            move || {
                let value = value.clone();
                store.updates().map(move |state| value(state)).boxed()
            }
        };
        Projection::from_parts(Arc::new(read), Arc::new(write), Arc::new(observe))
    }
}

async fn drive<S, A, E>(
    mut state: S,
    reducer: Reducer<S, A, E>,
    environment: E,
    mut inbox: mpsc::UnboundedReceiver<StoreMsg<S, A>>,
    current: watch::Sender<S>,
    feedback: mpsc::UnboundedSender<StoreMsg<S, A>>,
) where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
    E: Send + 'static,
{
    let mut subscribers: Vec<mpsc::UnboundedSender<S>> = Vec::new();
    let mut effects: JoinSet<()> = JoinSet::new();

    while let Some(message) = inbox.recv().await {
        while effects.try_join_next().is_some() {}

        match message {
            StoreMsg::Subscribe(tx) => {
                let _ = tx.send(state.clone());
                subscribers.push(tx);
            }
            StoreMsg::Action(action) => {
                let scheduled = reducer.reduce(&mut state, action, &environment);
                let _ = current.send(state.clone());
                subscribers.retain(|tx| tx.send(state.clone()).is_ok());
                tracing::trace!(effects = scheduled.len(), "applied action");

                for effect in scheduled {
                    let feedback = feedback.clone();
                    effects.spawn(async move {
                        let mut outputs = effect.into_stream();
                        while let Some(action) = outputs.next().await {
                            if feedback.send(StoreMsg::Action(action)).is_err() {
                                break;
                            }
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Log {
        entries: Vec<&'static str>,
    }

    #[derive(Clone)]
    enum Action {
        Record(&'static str),
        Kickoff,
    }

    fn recording_reducer() -> Reducer<Log, Action, ()> {
        Reducer::new(|state: &mut Log, action, _env| match action {
            Action::Record(entry) => {
                state.entries.push(entry);
                vec![]
            }
            Action::Kickoff => {
                state.entries.push("kickoff");
                vec![Effect::value(Action::Record("from effect"))]
            }
        })
    }

    async fn wait_for<S: Clone + Send + Sync + 'static>(
        updates: &mut BoxStream<'static, S>,
        predicate: impl Fn(&S) -> bool,
    ) -> S {
        loop {
            let state = updates.next().await.expect("store closed unexpectedly");
            if predicate(&state) {
                return state;
            }
        }
    }

    #[tokio::test]
    async fn test_actions_apply_in_dispatch_order() {
        let store = Store::new(Log { entries: vec![] }, recording_reducer(), ());
        let mut updates = store.updates();

        store.send(Action::Record("a"));
        store.send(Action::Record("b"));
        store.send(Action::Record("c"));

        let state = wait_for(&mut updates, |s: &Log| s.entries.len() == 3).await;
        assert_eq!(state.entries, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_effect_actions_feed_back_asynchronously() {
        let store = Store::new(Log { entries: vec![] }, recording_reducer(), ());
        let mut updates = store.updates();

        store.send(Action::Kickoff);

        let state = wait_for(&mut updates, |s: &Log| s.entries.len() == 2).await;
        assert_eq!(state.entries, vec!["kickoff", "from effect"]);
    }

    #[tokio::test]
    async fn test_updates_replays_current_state_first() {
        let store = Store::new(Log { entries: vec![] }, recording_reducer(), ());
        store.send(Action::Record("early"));

        // Subscribe through the same channel as dispatch, so the replayed
        // value reflects the preceding action.
        let mut updates = store.updates();
        let state = updates.next().await.unwrap();
        assert_eq!(state.entries, vec!["early"]);
    }

    #[tokio::test]
    async fn test_value_reflects_committed_state() {
        let store = Store::new(Log { entries: vec![] }, recording_reducer(), ());
        let mut updates = store.updates();
        store.send(Action::Record("x"));
        wait_for(&mut updates, |s: &Log| !s.entries.is_empty()).await;
        assert_eq!(store.value().entries, vec!["x"]);
    }

    #[tokio::test]
    async fn test_combine_concatenates_effects_in_order() {
        let first = Reducer::new(|state: &mut Vec<i32>, action: i32, _env: &()| {
            state.push(action);
            vec![]
        });
        let second = Reducer::new(|state: &mut Vec<i32>, action: i32, _env: &()| {
            state.push(action * 10);
            vec![]
        });
        let combined = Reducer::combine([first, second]);

        let mut state = Vec::new();
        combined.reduce(&mut state, 3, &());
        assert_eq!(state, vec![3, 30]);
    }

    #[tokio::test]
    async fn test_pull_back_ignores_unrelated_actions() {
        #[derive(Clone)]
        enum Global {
            Local(i32),
            Unrelated,
        }

        let local = Reducer::new(|count: &mut i32, add: i32, _env: &()| {
            *count += add;
            vec![]
        });
        let global = local.pull_back(
            |pair: &mut (i32, &'static str)| &mut pair.0,
            |action: &Global| match action {
                Global::Local(n) => Some(*n),
                Global::Unrelated => None,
            },
            Global::Local,
            |_env: &()| (),
        );

        let mut state = (0, "untouched");
        global.reduce(&mut state, Global::Local(5), &());
        global.reduce(&mut state, Global::Unrelated, &());
        assert_eq!(state, (5, "untouched"));
    }

    #[tokio::test]
    async fn test_pull_back_embeds_effect_outputs() {
        #[derive(Clone, Debug, PartialEq)]
        enum Global {
            Local(i32),
        }

        let local = Reducer::new(|_count: &mut i32, add: i32, _env: &()| {
            vec![Effect::value(add + 1)]
        });
        let global = local.pull_back(
            |count: &mut i32| count,
            |Global::Local(n): &Global| Some(*n),
            Global::Local,
            |_env: &()| (),
        );

        let mut state = 0;
        let effects = global.reduce(&mut state, Global::Local(1), &());
        assert_eq!(effects.len(), 1);
        let outputs = effects.into_iter().next().unwrap().collect().await;
        assert_eq!(outputs, vec![Global::Local(2)]);
    }
}
