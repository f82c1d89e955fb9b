//! Unidirectional state store.
//!
//! State changes only inside [`Reducer`]s. Side effects are returned as
//! [`Effect`] descriptors and run by the store's engine after the new state
//! is committed; the actions they produce come back through [`Dispatch`].
//! Keyed effects are tracked so that at most one activity runs per
//! [`CancelKey`]. [`TestStore`] replays the whole loop deterministically.

pub mod config;
pub mod effect;
pub mod engine;
pub mod features;
pub mod logging;
pub mod reducer;
pub mod store;
pub mod testing;

pub use effect::{CancelKey, Dispatch, Effect, EffectFamily};
pub use engine::{
    reset_error_hook, set_error_hook, Clock, EffectError, ErrorHook, TokioClock, VirtualClock,
};
pub use reducer::{
    reducer_fn, Combine, FnReducer, IfLet, PresentationAction, Reducer, Reduction, Scope,
};
pub use store::{ListenerHandle, Store, StoreError, StoreOptions};
pub use testing::{Exhaustivity, TestStore, TestStoreError};
