//! Effect execution engine.
//!
//! Interprets [`Effect`] descriptors on a tokio runtime and owns the
//! cancellation-key registry. Per key the lifecycle is:
//!
//! ```text
//! Idle ──register──→ Registered ──→ Superseded | Cancelled | Completed
//! ```
//!
//! When a key is reused, the old registration is torn down (flag cancelled,
//! tasks aborted, cleanup run) before the new activity is spawned, so a stale
//! executor can never dispatch after its replacement has started.

pub mod clock;
pub mod error;
mod lifetime;
mod registry;

use std::future::Future;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use futures::FutureExt;
use tokio::runtime::Handle;
use uuid::Uuid;

use crate::effect::{CancelKey, Cleanup, Dispatch, Effect, EffectFamily};

pub use clock::{Clock, TokioClock, VirtualClock};
pub use error::{reset_error_hook, set_error_hook, EffectError, ErrorHook};

use lifetime::Lifetime;
use registry::{Admission, Registration, Registry};

/// Runs effects for one store.
pub struct EffectEngine<A> {
    shared: Arc<EngineShared>,
    _action: PhantomData<fn(A)>,
}

struct EngineShared {
    id: Uuid,
    runtime: Handle,
    clock: Arc<dyn Clock>,
    error_hook: Option<ErrorHook>,
    registry: Registry,
    lifetime: Lifetime,
}

impl EngineShared {
    fn report(&self, error: EffectError) {
        error::report(self.error_hook.as_ref(), error);
    }

    fn teardown(&self, key: &CancelKey, registration: Registration) {
        tracing::debug!(
            store = %self.id,
            key = %key,
            family = %registration.family,
            "Tearing down registration"
        );
        if let Some(cleanup) = registration.teardown() {
            self.run_cleanup(key, cleanup);
        }
    }

    fn run_cleanup(&self, key: &CancelKey, cleanup: Cleanup) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(cleanup)) {
            self.report(EffectError::CleanupPanicked {
                key: key.clone(),
                message: error::panic_message(payload),
            });
        }
    }
}

impl<A: Send + 'static> EffectEngine<A> {
    pub fn new(runtime: Handle, clock: Arc<dyn Clock>, error_hook: Option<ErrorHook>) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                id: Uuid::new_v4(),
                runtime,
                clock,
                error_hook,
                registry: Registry::new(),
                lifetime: Lifetime::new(),
            }),
            _action: PhantomData,
        }
    }

    /// Identifier recorded on this engine's log events.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.shared.clock)
    }

    /// Keys with a live registration, sorted.
    pub fn active_keys(&self) -> Vec<CancelKey> {
        self.shared.registry.keys()
    }

    pub fn registered_family(&self, key: &str) -> Option<EffectFamily> {
        self.shared.registry.family_of(key)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lifetime.is_ended()
    }

    /// Start interpreting `effect`. Returns once every member has been
    /// started; executors run on the runtime and send through `dispatch`.
    pub fn execute(&self, effect: Effect<A>, dispatch: &Dispatch<A>) {
        if self.shared.lifetime.is_ended() {
            if !effect.is_none() {
                tracing::debug!(store = %self.shared.id, ?effect, "Engine shut down, effect dropped");
            }
            return;
        }
        // Sleeps are created here, possibly on a thread outside the runtime.
        let _entered = self.shared.runtime.enter();

        match effect {
            Effect::None => {}
            Effect::Run(run) => {
                let dispatch = dispatch.clone();
                self.spawn_detached(EffectFamily::Run, async move { run(dispatch).await });
            }
            Effect::FireAndForget(task) => {
                self.spawn_detached(EffectFamily::FireAndForget, async move { task().await });
            }
            Effect::Batch(effects) => {
                for effect in effects {
                    self.execute(effect, dispatch);
                }
            }
            Effect::Cancellable { key, run } => {
                let (abort, registration) = AbortHandle::new_pair();
                let Some((id, dispatch)) =
                    self.register(&key, EffectFamily::Cancellable, vec![abort], dispatch)
                else {
                    return;
                };
                self.spawn_keyed(
                    key,
                    id,
                    EffectFamily::Cancellable,
                    registration,
                    true,
                    async move { run(dispatch).await },
                );
            }
            Effect::Debounced { key, delay, run } => {
                let (abort, registration) = AbortHandle::new_pair();
                let Some((id, dispatch)) =
                    self.register(&key, EffectFamily::Debounced, vec![abort], dispatch)
                else {
                    return;
                };
                let quiet = self.shared.clock.sleep(delay);
                let store = self.shared.id;
                let fired_key = key.clone();
                self.spawn_keyed(key, id, EffectFamily::Debounced, registration, true, async move {
                    quiet.await;
                    tracing::debug!(store = %store, key = %fired_key, "Debounce window elapsed");
                    run(dispatch).await
                });
            }
            Effect::Throttled { key, delay, run } => {
                let (abort_run, run_registration) = AbortHandle::new_pair();
                let (abort_window, window_registration) = AbortHandle::new_pair();
                let Some((id, dispatch)) = self.register(
                    &key,
                    EffectFamily::Throttled,
                    vec![abort_run, abort_window],
                    dispatch,
                ) else {
                    return;
                };
                self.spawn_keyed(
                    key.clone(),
                    id,
                    EffectFamily::Throttled,
                    run_registration,
                    false,
                    async move { run(dispatch).await },
                );
                self.spawn_throttle_window(key, id, delay, window_registration);
            }
            Effect::AfterDelay { delay, run } => {
                let wait = self.shared.clock.sleep(delay);
                let dispatch = dispatch.clone();
                self.spawn_detached(EffectFamily::AfterDelay, async move {
                    wait.await;
                    run(dispatch).await
                });
            }
            Effect::Subscription { key, setup } => {
                let Some((id, dispatch)) =
                    self.register(&key, EffectFamily::Subscription, Vec::new(), dispatch)
                else {
                    return;
                };
                match catch_unwind(AssertUnwindSafe(move || setup(dispatch))) {
                    Ok(cleanup) => {
                        if let Err(cleanup) = self.shared.registry.attach_cleanup(&key, id, cleanup)
                        {
                            // Superseded while the setup was running.
                            self.shared.run_cleanup(&key, cleanup);
                        }
                    }
                    Err(payload) => {
                        // Cancel the flag so a dispatch the setup kept goes dead.
                        if let Some(registration) = self.shared.registry.remove_if(&key, id) {
                            self.shared.teardown(&key, registration);
                        }
                        self.shared.report(EffectError::SetupPanicked {
                            key,
                            message: error::panic_message(payload),
                        });
                    }
                }
            }
            Effect::Cancel(key) => match self.shared.registry.remove(&key) {
                Some(registration) => self.shared.teardown(&key, registration),
                None => {
                    tracing::trace!(store = %self.shared.id, key = %key, "Cancel of idle key ignored");
                }
            },
        }
    }

    /// Tear down every registration and stop unkeyed work. Idempotent.
    pub fn shutdown(&self) {
        if !self.shared.lifetime.end() {
            return;
        }
        let registrations = self.shared.registry.drain();
        tracing::debug!(
            store = %self.shared.id,
            registrations = registrations.len(),
            "Shutting down effect engine"
        );
        for (key, registration) in registrations {
            self.shared.teardown(&key, registration);
        }
    }

    /// Admit a keyed activity, tearing down whatever held the key first.
    /// Returns `None` when a throttle window swallows the call.
    fn register(
        &self,
        key: &CancelKey,
        family: EffectFamily,
        aborts: Vec<AbortHandle>,
        dispatch: &Dispatch<A>,
    ) -> Option<(u64, Dispatch<A>)> {
        match self.shared.registry.admit(key, family, aborts) {
            Admission::Throttled => {
                tracing::trace!(store = %self.shared.id, key = %key, "Throttled call dropped");
                None
            }
            Admission::Registered {
                id,
                flag,
                superseded,
            } => {
                if let Some(old) = superseded {
                    tracing::debug!(
                        store = %self.shared.id,
                        key = %key,
                        old = %old.family,
                        new = %family,
                        "Superseding registration"
                    );
                    self.shared.teardown(key, old);
                } else {
                    tracing::debug!(store = %self.shared.id, key = %key, %family, "Registered");
                }
                Some((id, dispatch.guarded(flag)))
            }
        }
    }

    fn spawn_keyed<F>(
        &self,
        key: CancelKey,
        id: u64,
        family: EffectFamily,
        registration: AbortRegistration,
        release_on_exit: bool,
        work: F,
    ) where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let release_key = key.clone();
        self.shared.runtime.spawn(async move {
            let _release = scopeguard::guard(Arc::clone(&shared), move |shared| {
                if release_on_exit && shared.registry.remove_if(&release_key, id).is_some() {
                    tracing::debug!(store = %shared.id, key = %release_key, %family, "Completed");
                }
            });
            let outcome = AssertUnwindSafe(Abortable::new(work, registration))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(source))) => shared.report(EffectError::Failed {
                    family,
                    key: Some(key.clone()),
                    source,
                }),
                Ok(Err(_aborted)) => {
                    tracing::trace!(store = %shared.id, key = %key, %family, "Aborted");
                }
                Err(payload) => shared.report(EffectError::Panicked {
                    family,
                    key: Some(key.clone()),
                    message: error::panic_message(payload),
                }),
            }
        });
    }

    fn spawn_throttle_window(
        &self,
        key: CancelKey,
        id: u64,
        delay: Duration,
        registration: AbortRegistration,
    ) {
        let window = Abortable::new(self.shared.clock.sleep(delay), registration);
        let shared = Arc::clone(&self.shared);
        self.shared.runtime.spawn(async move {
            if window.await.is_ok() && shared.registry.remove_if(&key, id).is_some() {
                tracing::debug!(store = %shared.id, key = %key, "Throttle window closed");
            }
        });
    }

    fn spawn_detached<F>(&self, family: EffectFamily, work: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.shared.runtime.spawn(async move {
            let lifetime = shared.lifetime.clone();
            let outcome = tokio::select! {
                _ = lifetime.ended() => {
                    tracing::trace!(store = %shared.id, %family, "Stopped by store teardown");
                    return;
                }
                outcome = AssertUnwindSafe(work).catch_unwind() => outcome,
            };
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(source)) => shared.report(EffectError::Failed {
                    family,
                    key: None,
                    source,
                }),
                Err(payload) => shared.report(EffectError::Panicked {
                    family,
                    key: None,
                    message: error::panic_message(payload),
                }),
            }
        });
    }
}
