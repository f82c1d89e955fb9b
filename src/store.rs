//! The store: owns state, runs the dispatch loop, hands effects to the engine.
//!
//! `dispatch` reduces and commits under the state lock, then releases the
//! lock before starting the returned effect and notifying subscribers. An
//! effect that dispatches synchronously (a subscription setup, for example)
//! therefore re-enters `dispatch` without deadlocking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::effect::{CancelKey, Dispatch};
use crate::engine::{Clock, EffectEngine, EffectError, ErrorHook, TokioClock};
use crate::reducer::Reducer;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no tokio runtime available to run effects; create the store inside a runtime or pass one in StoreOptions")]
    NoRuntime,
}

/// Construction options for [`Store::with_options`].
#[derive(Default, Clone)]
pub struct StoreOptions {
    clock: Option<Arc<dyn Clock>>,
    error_hook: Option<ErrorHook>,
    runtime: Option<Handle>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time source for timer-driven effects. Defaults to [`TokioClock`].
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Hook receiving this store's effect failures instead of the global one.
    pub fn error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EffectError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Runtime executors are spawned on. Defaults to the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

/// Where actions dispatched by effects go.
pub(crate) enum Feedback<A> {
    /// Straight back into the store's own dispatch loop.
    Store,
    /// Into a queue drained by the test harness.
    Intercept(mpsc::UnboundedSender<A>),
}

type Listener<S> = Arc<dyn Fn(&Arc<S>) + Send + Sync>;

/// Cheap, clonable handle to a running store.
///
/// The store is torn down when [`Store::destroy`] is called or the last
/// handle is dropped.
pub struct Store<R: Reducer> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<R: Reducer> {
    state: Mutex<Arc<R::State>>,
    reducer: R,
    deps: R::Dependencies,
    engine: EffectEngine<R::Action>,
    feedback: Dispatch<R::Action>,
    /// Bumped under the state lock on every commit that changes the state.
    version: AtomicU64,
    /// Highest version subscribers have been told about.
    notified: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener<R::State>)>>,
    next_listener: AtomicU64,
    destroyed: AtomicBool,
}

impl<R: Reducer> Store<R> {
    /// Create a store on the current tokio runtime with a real-time clock.
    pub fn new(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
    ) -> Result<Self, StoreError> {
        Self::with_options(initial, reducer, deps, StoreOptions::default())
    }

    pub fn with_options(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        Self::build(initial.into(), reducer, deps, options, Feedback::Store)
    }

    pub(crate) fn build(
        initial: Arc<R::State>,
        reducer: R,
        deps: R::Dependencies,
        options: StoreOptions,
        feedback: Feedback<R::Action>,
    ) -> Result<Self, StoreError> {
        let runtime = match options.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| StoreError::NoRuntime)?,
        };
        let clock = options
            .clock
            .unwrap_or_else(|| Arc::new(TokioClock::new()) as Arc<dyn Clock>);
        let engine = EffectEngine::new(runtime, clock, options.error_hook);

        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<R>>| {
            let feedback = match feedback {
                Feedback::Store => {
                    let weak = weak.clone();
                    Dispatch::new(move |action| {
                        if let Some(inner) = weak.upgrade() {
                            Store { inner }.dispatch(action);
                        }
                    })
                }
                Feedback::Intercept(queue) => Dispatch::new(move |action| {
                    if queue.send(action).is_err() {
                        tracing::trace!("harness queue closed, effect action dropped");
                    }
                }),
            };
            StoreInner {
                state: Mutex::new(initial),
                reducer,
                deps,
                engine,
                feedback,
                version: AtomicU64::new(0),
                notified: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                destroyed: AtomicBool::new(false),
            }
        });
        tracing::debug!(store = %inner.engine.id(), "Store created");
        Ok(Self { inner })
    }

    /// Identifier recorded on this store's log events.
    pub fn id(&self) -> Uuid {
        self.inner.engine.id()
    }

    /// Snapshot of the committed state.
    pub fn state(&self) -> Arc<R::State> {
        self.inner.state.lock().clone()
    }

    /// Borrow the committed state without cloning the `Arc`.
    ///
    /// The state lock is held while `f` runs; do not dispatch from it.
    pub fn with_state<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        f(&self.inner.state.lock())
    }

    pub fn dependencies(&self) -> &R::Dependencies {
        &self.inner.deps
    }

    /// Reduce `action`, commit the result, start its effect, notify subscribers.
    ///
    /// A panicking reducer propagates out of this call and leaves the state
    /// unchanged.
    pub fn dispatch(&self, action: R::Action) {
        let inner = &self.inner;
        if inner.destroyed.load(Ordering::SeqCst) {
            tracing::warn!(store = %inner.engine.id(), "Dispatch after destroy ignored");
            return;
        }

        let (changed, effect) = {
            let mut state = inner.state.lock();
            let previous = state.clone();
            let (next, effect) = inner.reducer.reduce(Arc::clone(&previous), action, &inner.deps);
            let changed = !Arc::ptr_eq(&previous, &next);
            if changed {
                *state = next;
                inner.version.fetch_add(1, Ordering::SeqCst);
            }
            (changed, effect)
        };

        inner.engine.execute(effect, &inner.feedback);

        if changed {
            self.notify_latest();
        }
    }

    /// Tell subscribers about the newest commit, unless a newer dispatch
    /// (a re-entrant one started by the effect, or one on another thread)
    /// already did.
    fn notify_latest(&self) {
        let inner = &self.inner;
        let (current, version) = {
            let state = inner.state.lock();
            (state.clone(), inner.version.load(Ordering::SeqCst))
        };
        if inner.notified.fetch_max(version, Ordering::SeqCst) >= version {
            return;
        }
        let listeners: Vec<_> = inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&current);
        }
    }

    /// Call `listener` with the new state after every changing dispatch.
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<R::State>) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.inner);
        ListenerHandle {
            unsubscribe: Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.lock().retain(|(existing, _)| *existing != id);
                }
            }),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Keys with a live effect registration, sorted.
    pub fn active_effect_keys(&self) -> Vec<CancelKey> {
        self.inner.engine.active_keys()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.engine.clock()
    }

    /// Tear down every effect, drop subscribers, refuse further dispatches.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(store = %self.inner.engine.id(), "Destroying store");
        self.inner.engine.shutdown();
        self.inner.listeners.lock().clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }
}

impl<R: Reducer> Drop for StoreInner<R> {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

/// Returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`ListenerHandle::unsubscribe`] to remove it.
#[must_use = "keep the handle to unsubscribe later"]
pub struct ListenerHandle {
    unsubscribe: Box<dyn FnOnce() + Send + Sync>,
}

impl ListenerHandle {
    pub fn unsubscribe(self) {
        (self.unsubscribe)();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").finish_non_exhaustive()
    }
}
