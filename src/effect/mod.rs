//! Effect descriptors.
//!
//! An [`Effect`] is inert data describing work a reducer wants done after
//! its state transition commits. Building one never runs anything; only the
//! engine in [`crate::engine`] interprets it.
//!
//! # Families
//!
//! ```text
//! None            nothing to do
//! Run             async executor, may dispatch 0..n actions
//! FireAndForget   async task, cannot dispatch
//! Batch           members start concurrently
//! Cancellable     Run registered under a key
//! Debounced       fires after `delay` of quiet under a key
//! Throttled       fires immediately, drops calls during cooldown
//! AfterDelay      fires once after `delay`, never keyed
//! Subscription    long-running setup returning a cleanup closure
//! Cancel          tears down whatever is registered under a key
//! ```

mod dispatch;
mod key;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

pub use dispatch::{CancelFlag, Dispatch};
pub use key::CancelKey;

/// Future returned by every executor. Errors are reported through the error hook.
pub type EffectFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Executor for families that may dispatch.
pub type Executor<A> = Box<dyn FnOnce(Dispatch<A>) -> EffectFuture + Send>;

/// Executor for [`Effect::FireAndForget`].
pub type Task = Box<dyn FnOnce() -> EffectFuture + Send>;

/// Teardown returned by a subscription setup. Runs exactly once.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// Setup closure of a subscription.
pub type SubscriptionSetup<A> = Box<dyn FnOnce(Dispatch<A>) -> Cleanup + Send>;

type DispatchAdapter<P, C> = Arc<dyn Fn(&Dispatch<P>) -> Dispatch<C> + Send + Sync>;

/// Family of an executing effect, used in logs and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectFamily {
    Run,
    FireAndForget,
    Cancellable,
    Debounced,
    Throttled,
    AfterDelay,
    Subscription,
}

impl fmt::Display for EffectFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectFamily::Run => "run",
            EffectFamily::FireAndForget => "fire_and_forget",
            EffectFamily::Cancellable => "cancellable",
            EffectFamily::Debounced => "debounced",
            EffectFamily::Throttled => "throttled",
            EffectFamily::AfterDelay => "after_delay",
            EffectFamily::Subscription => "subscription",
        };
        f.write_str(name)
    }
}

/// A side effect described as data.
pub enum Effect<A> {
    None,
    Run(Executor<A>),
    FireAndForget(Task),
    Batch(Vec<Effect<A>>),
    Cancellable {
        key: CancelKey,
        run: Executor<A>,
    },
    Debounced {
        key: CancelKey,
        delay: Duration,
        run: Executor<A>,
    },
    Throttled {
        key: CancelKey,
        delay: Duration,
        run: Executor<A>,
    },
    AfterDelay {
        delay: Duration,
        run: Executor<A>,
    },
    Subscription {
        key: CancelKey,
        setup: SubscriptionSetup<A>,
    },
    Cancel(CancelKey),
}

fn executor<A, F, Fut>(f: F) -> Executor<A>
where
    F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move |dispatch| Box::pin(f(dispatch)))
}

impl<A: Send + 'static> Effect<A> {
    pub fn none() -> Self {
        Effect::None
    }

    /// Run `f` once; it may dispatch any number of actions.
    pub fn run<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::Run(executor(f))
    }

    /// Dispatch a single action as soon as the engine picks this up.
    pub fn send(action: A) -> Self {
        Effect::run(move |dispatch| async move {
            dispatch.send(action);
            Ok(())
        })
    }

    /// Ask the presenting parent to dismiss the current child feature.
    pub fn dismiss() -> Self {
        Effect::run(|dispatch| async move {
            dispatch.dismiss();
            Ok(())
        })
    }

    pub fn fire_and_forget<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::FireAndForget(Box::new(move || Box::pin(f())))
    }

    /// Merge effects into one, normalizing the result.
    ///
    /// `None` members are dropped and nested batches flattened; an empty
    /// batch is `None` and a single member is returned unwrapped.
    pub fn batch(effects: impl IntoIterator<Item = Effect<A>>) -> Self {
        let mut members = Vec::new();
        for effect in effects {
            flatten_into(effect, &mut members);
        }
        match members.len() {
            0 => Effect::None,
            1 => members.pop().unwrap_or(Effect::None),
            _ => Effect::Batch(members),
        }
    }

    pub fn merge(self, other: Effect<A>) -> Self {
        Effect::batch([self, other])
    }

    pub fn cancellable<F, Fut>(key: impl Into<CancelKey>, f: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::Cancellable {
            key: key.into(),
            run: executor(f),
        }
    }

    pub fn debounced<F, Fut>(key: impl Into<CancelKey>, delay: Duration, f: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::Debounced {
            key: key.into(),
            delay,
            run: executor(f),
        }
    }

    pub fn throttled<F, Fut>(key: impl Into<CancelKey>, delay: Duration, f: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::Throttled {
            key: key.into(),
            delay,
            run: executor(f),
        }
    }

    pub fn after_delay<F, Fut>(delay: Duration, f: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Effect::AfterDelay {
            delay,
            run: executor(f),
        }
    }

    /// Long-running effect. `setup` may keep the dispatch and send from
    /// anywhere; the returned closure runs once when the key is cancelled,
    /// superseded or the store is destroyed.
    pub fn subscription<F, C>(key: impl Into<CancelKey>, setup: F) -> Self
    where
        F: FnOnce(Dispatch<A>) -> C + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        Effect::Subscription {
            key: key.into(),
            setup: Box::new(move |dispatch| Box::new(setup(dispatch)) as Cleanup),
        }
    }

    pub fn cancel(key: impl Into<CancelKey>) -> Self {
        Effect::Cancel(key.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Key this effect registers under or cancels, if any.
    pub fn key(&self) -> Option<&CancelKey> {
        match self {
            Effect::Cancellable { key, .. }
            | Effect::Debounced { key, .. }
            | Effect::Throttled { key, .. }
            | Effect::Subscription { key, .. }
            | Effect::Cancel(key) => Some(key),
            _ => None,
        }
    }

    /// Lift this effect into a parent action vocabulary.
    ///
    /// Keys, delays and the dismiss capability are preserved; every action
    /// the executors dispatch is passed through `lift`.
    pub fn map<B, F>(self, lift: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let lift = Arc::new(lift);
        self.map_dispatch(Arc::new(move |dispatch: &Dispatch<B>| {
            let lift = Arc::clone(&lift);
            dispatch.map(move |action| lift(action))
        }))
    }

    pub(crate) fn map_dispatch<B>(self, adapt: DispatchAdapter<B, A>) -> Effect<B>
    where
        B: Send + 'static,
    {
        match self {
            Effect::None => Effect::None,
            Effect::Run(run) => Effect::Run(adapt_executor(run, adapt)),
            Effect::FireAndForget(task) => Effect::FireAndForget(task),
            Effect::Batch(effects) => Effect::Batch(
                effects
                    .into_iter()
                    .map(|effect| effect.map_dispatch(Arc::clone(&adapt)))
                    .collect(),
            ),
            Effect::Cancellable { key, run } => Effect::Cancellable {
                key,
                run: adapt_executor(run, adapt),
            },
            Effect::Debounced { key, delay, run } => Effect::Debounced {
                key,
                delay,
                run: adapt_executor(run, adapt),
            },
            Effect::Throttled { key, delay, run } => Effect::Throttled {
                key,
                delay,
                run: adapt_executor(run, adapt),
            },
            Effect::AfterDelay { delay, run } => Effect::AfterDelay {
                delay,
                run: adapt_executor(run, adapt),
            },
            Effect::Subscription { key, setup } => Effect::Subscription {
                key,
                setup: Box::new(move |dispatch: Dispatch<B>| setup(adapt(&dispatch))),
            },
            Effect::Cancel(key) => Effect::Cancel(key),
        }
    }
}

fn adapt_executor<P, C>(run: Executor<C>, adapt: DispatchAdapter<P, C>) -> Executor<P>
where
    P: 'static,
    C: 'static,
{
    Box::new(move |dispatch: Dispatch<P>| run(adapt(&dispatch)))
}

fn flatten_into<A>(effect: Effect<A>, members: &mut Vec<Effect<A>>) {
    match effect {
        Effect::None => {}
        Effect::Batch(inner) => {
            for effect in inner {
                flatten_into(effect, members);
            }
        }
        other => members.push(other),
    }
}

impl<A> Default for Effect<A> {
    fn default() -> Self {
        Effect::None
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => f.write_str("None"),
            Effect::Run(_) => f.write_str("Run"),
            Effect::FireAndForget(_) => f.write_str("FireAndForget"),
            Effect::Batch(effects) => f.debug_tuple("Batch").field(effects).finish(),
            Effect::Cancellable { key, .. } => {
                f.debug_struct("Cancellable").field("key", key).finish()
            }
            Effect::Debounced { key, delay, .. } => f
                .debug_struct("Debounced")
                .field("key", key)
                .field("delay", delay)
                .finish(),
            Effect::Throttled { key, delay, .. } => f
                .debug_struct("Throttled")
                .field("key", key)
                .field("delay", delay)
                .finish(),
            Effect::AfterDelay { delay, .. } => {
                f.debug_struct("AfterDelay").field("delay", delay).finish()
            }
            Effect::Subscription { key, .. } => {
                f.debug_struct("Subscription").field("key", key).finish()
            }
            Effect::Cancel(key) => f.debug_tuple("Cancel").field(key).finish(),
        }
    }
}
