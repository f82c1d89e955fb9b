//! Reducers and the operators that compose them.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Reducer ──→ (State, Effect) ──→ Store commits ──→ Engine runs
//!    ↑                                                              │
//!    └──────────────────────── Dispatch ────────────────────────────┘
//! ```
//!
//! A reducer is the only place where state transitions happen. It must be
//! pure: no I/O, no direct dispatch, same inputs give same outputs. Work that
//! touches the outside world is returned as an [`Effect`].
//!
//! State travels as `Arc<State>`. Returning the input `Arc` unchanged tells
//! every layer above that nothing changed, so composition operators and the
//! store can skip rebuilding parents and notifying subscribers. Reducers may
//! use `Arc::make_mut`: the store always keeps its own reference while a
//! reducer runs, so `make_mut` clones instead of mutating shared state.

mod combine;
mod if_let;
mod scope;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::effect::Effect;

pub use combine::Combine;
pub use if_let::{IfLet, PresentationAction};
pub use scope::Scope;

/// Result of one reducer step.
pub type Reduction<S, A> = (Arc<S>, Effect<A>);

/// Pure state transition: `(State, Action, Dependencies) -> (State, Effect)`.
pub trait Reducer: Send + Sync + 'static {
    /// The state type this reducer operates on.
    type State: Send + Sync + 'static;

    /// The action type this reducer handles.
    type Action: Send + 'static;

    /// Capabilities available read-only to the reducer.
    type Dependencies: Send + Sync + 'static;

    /// Process an action and return the next state and the effect to run.
    ///
    /// Return `state` itself when nothing changed.
    fn reduce(
        &self,
        state: Arc<Self::State>,
        action: Self::Action,
        deps: &Self::Dependencies,
    ) -> Reduction<Self::State, Self::Action>;
}

impl<R: Reducer> Reducer for Arc<R> {
    type State = R::State;
    type Action = R::Action;
    type Dependencies = R::Dependencies;

    fn reduce(
        &self,
        state: Arc<Self::State>,
        action: Self::Action,
        deps: &Self::Dependencies,
    ) -> Reduction<Self::State, Self::Action> {
        (**self).reduce(state, action, deps)
    }
}

/// Reducer backed by a closure. Build with [`reducer_fn`].
pub struct FnReducer<S, A, D, F> {
    f: F,
    _types: PhantomData<fn(Arc<S>, A, &D)>,
}

/// Wrap a closure as a [`Reducer`].
pub fn reducer_fn<S, A, D, F>(f: F) -> FnReducer<S, A, D, F>
where
    F: Fn(Arc<S>, A, &D) -> Reduction<S, A> + Send + Sync + 'static,
{
    FnReducer {
        f,
        _types: PhantomData,
    }
}

impl<S, A, D, F> Reducer for FnReducer<S, A, D, F>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
    D: Send + Sync + 'static,
    F: Fn(Arc<S>, A, &D) -> Reduction<S, A> + Send + Sync + 'static,
{
    type State = S;
    type Action = A;
    type Dependencies = D;

    fn reduce(&self, state: Arc<S>, action: A, deps: &D) -> Reduction<S, A> {
        (self.f)(state, action, deps)
    }
}
