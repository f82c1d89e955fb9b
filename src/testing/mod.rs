//! Exhaustive test harness.
//!
//! [`TestStore`] wraps a [`Store`] whose effects feed a queue instead of the
//! dispatch loop. Every action an effect produces must be taken off that
//! queue with [`TestStore::receive`] before the test moves on; time only
//! moves when the test calls [`TestStore::advance_time`].
//!
//! ```text
//! send(user action) ──→ reduce + commit ──→ effects ──→ pending queue
//!                                                          │
//! receive(expected) ←──────────────────────────────────────┘
//!        └──→ reduce + commit ──→ effects ──→ ...
//! ```

mod error;

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::HarnessConfig;
use crate::engine::VirtualClock;
use crate::reducer::Reducer;
use crate::store::{Feedback, Store, StoreError, StoreOptions};

pub use error::TestStoreError;

/// Whether unasserted effect actions fail the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exhaustivity {
    #[default]
    On,
    /// Skip over actions `receive` was not asked for; they are still applied.
    Off,
}

pub struct TestStore<R: Reducer> {
    store: Store<R>,
    clock: VirtualClock,
    queue: mpsc::UnboundedReceiver<R::Action>,
    pending: VecDeque<R::Action>,
    exhaustivity: Exhaustivity,
    receive_timeout: Duration,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::Action: Debug,
{
    /// Harness with default settings. Must be called inside a tokio runtime.
    #[track_caller]
    pub fn new(initial: impl Into<Arc<R::State>>, reducer: R, deps: R::Dependencies) -> Self {
        Self::with_config(initial, reducer, deps, &HarnessConfig::default())
    }

    #[track_caller]
    pub fn with_config(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
        config: &HarnessConfig,
    ) -> Self {
        Self::try_with_options(initial, reducer, deps, config, StoreOptions::new())
            .unwrap_or_else(|err| panic!("TestStore: {}", err))
    }

    /// Build a harness on top of `options`. The clock is always replaced by
    /// the harness's [`VirtualClock`].
    pub fn try_with_options(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
        config: &HarnessConfig,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let clock = VirtualClock::with_settle_yields(config.settle_yields);
        Self::build(initial, reducer, deps, config, options, clock)
    }

    /// Harness driven by `clock`, for dependencies that sleep on the same
    /// clock the store uses.
    #[track_caller]
    pub fn with_clock(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
        clock: VirtualClock,
    ) -> Self {
        Self::build(
            initial,
            reducer,
            deps,
            &HarnessConfig::default(),
            StoreOptions::new(),
            clock,
        )
        .unwrap_or_else(|err| panic!("TestStore: {}", err))
    }

    fn build(
        initial: impl Into<Arc<R::State>>,
        reducer: R,
        deps: R::Dependencies,
        config: &HarnessConfig,
        options: StoreOptions,
        clock: VirtualClock,
    ) -> Result<Self, StoreError> {
        let (sender, queue) = mpsc::unbounded_channel();
        let store = Store::build(
            initial.into(),
            reducer,
            deps,
            options.clock(clock.clone()),
            Feedback::Intercept(sender),
        )?;
        Ok(Self {
            store,
            clock,
            queue,
            pending: VecDeque::new(),
            exhaustivity: if config.exhaustive {
                Exhaustivity::On
            } else {
                Exhaustivity::Off
            },
            receive_timeout: config.receive_timeout(),
        })
    }

    pub fn set_exhaustivity(&mut self, exhaustivity: Exhaustivity) {
        self.exhaustivity = exhaustivity;
    }

    pub fn exhaustivity(&self) -> Exhaustivity {
        self.exhaustivity
    }

    /// How long `receive` waits, in real time, for an effect action.
    pub fn set_receive_timeout(&mut self, timeout: Duration) {
        self.receive_timeout = timeout;
    }

    pub fn state(&self) -> Arc<R::State> {
        self.store.state()
    }

    pub fn store(&self) -> &Store<R> {
        &self.store
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Number of effect actions received but not yet asserted.
    pub fn pending_count(&mut self) -> usize {
        self.collect();
        self.pending.len()
    }

    /// Dispatch a user action and check the committed state.
    #[track_caller]
    pub fn send(&mut self, action: R::Action, assert: impl FnOnce(&R::State)) {
        if let Err(err) = self.try_send(action, assert) {
            panic!("{}", err);
        }
    }

    pub fn try_send(
        &mut self,
        action: R::Action,
        assert: impl FnOnce(&R::State),
    ) -> Result<(), TestStoreError> {
        if self.exhaustivity == Exhaustivity::On {
            self.check_no_pending_actions()?;
        }
        tracing::debug!(?action, "TestStore send");
        self.store.dispatch(action);
        assert(&self.store.state());
        Ok(())
    }

    /// Wait for the next effect action, apply it, and check the committed state.
    pub async fn receive(&mut self, expected: R::Action, assert: impl FnOnce(&R::State))
    where
        R::Action: PartialEq,
    {
        if let Err(err) = self.try_receive(expected, assert).await {
            panic!("{}", err);
        }
    }

    pub async fn try_receive(
        &mut self,
        expected: R::Action,
        assert: impl FnOnce(&R::State),
    ) -> Result<(), TestStoreError>
    where
        R::Action: PartialEq,
    {
        let description = format!("{:?}", expected);
        self.receive_where(&description, |action| *action == expected, assert)
            .await
    }

    /// Like [`TestStore::receive`], for actions that are easier to match
    /// than to rebuild.
    pub async fn receive_matching(
        &mut self,
        predicate: impl Fn(&R::Action) -> bool,
        assert: impl FnOnce(&R::State),
    ) {
        if let Err(err) = self.try_receive_matching(predicate, assert).await {
            panic!("{}", err);
        }
    }

    pub async fn try_receive_matching(
        &mut self,
        predicate: impl Fn(&R::Action) -> bool,
        assert: impl FnOnce(&R::State),
    ) -> Result<(), TestStoreError> {
        self.receive_where("an action matching the predicate", predicate, assert)
            .await
    }

    async fn receive_where(
        &mut self,
        description: &str,
        predicate: impl Fn(&R::Action) -> bool,
        assert: impl FnOnce(&R::State),
    ) -> Result<(), TestStoreError> {
        loop {
            let action = self.next_action().await?;
            if predicate(&action) {
                tracing::debug!(?action, "TestStore receive");
                self.store.dispatch(action);
                assert(&self.store.state());
                return Ok(());
            }
            match self.exhaustivity {
                Exhaustivity::On => {
                    let received = format!("{:?}", action);
                    self.pending.push_front(action);
                    return Err(TestStoreError::UnexpectedAction {
                        expected: description.to_string(),
                        received,
                    });
                }
                Exhaustivity::Off => {
                    tracing::debug!(?action, "TestStore skipping unasserted action");
                    self.store.dispatch(action);
                }
            }
        }
    }

    async fn next_action(&mut self) -> Result<R::Action, TestStoreError> {
        self.collect();
        if let Some(action) = self.pending.pop_front() {
            return Ok(action);
        }
        match tokio::time::timeout(self.receive_timeout, self.queue.recv()).await {
            Ok(Some(action)) => Ok(action),
            Ok(None) | Err(_) => Err(TestStoreError::ReceiveTimeout {
                timeout: self.receive_timeout,
            }),
        }
    }

    /// Move the virtual clock forward, firing due timers in deadline order.
    pub async fn advance_time(&mut self, by: Duration) {
        self.clock.advance(by).await;
        self.collect();
    }

    /// Yield so effects already in flight can deliver their actions.
    pub async fn settle(&mut self) {
        self.clock.settle().await;
        self.collect();
    }

    /// Apply every action received so far without asserting on it.
    pub fn skip_received_actions(&mut self) {
        self.collect();
        let received: Vec<_> = self.pending.drain(..).collect();
        for action in received {
            tracing::debug!(?action, "TestStore applying skipped action");
            self.store.dispatch(action);
        }
    }

    /// Fail if any effect action is waiting to be asserted.
    pub fn check_no_pending_actions(&mut self) -> Result<(), TestStoreError> {
        self.collect();
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(TestStoreError::PendingActions {
            count: self.pending.len(),
            actions: self.pending.iter().map(|a| format!("{:?}", a)).collect(),
        })
    }

    #[track_caller]
    pub fn assert_no_pending_actions(&mut self) {
        if let Err(err) = self.check_no_pending_actions() {
            panic!("{}", err);
        }
    }

    fn collect(&mut self) {
        while let Ok(action) = self.queue.try_recv() {
            self.pending.push_back(action);
        }
    }
}

impl<R: Reducer> Drop for TestStore<R> {
    fn drop(&mut self) {
        while let Ok(action) = self.queue.try_recv() {
            self.pending.push_back(action);
        }
        let leftover = self.pending.len();
        self.store.destroy();
        if self.exhaustivity == Exhaustivity::On && leftover > 0 && !std::thread::panicking() {
            panic!(
                "TestStore dropped with {} action(s) from effects never asserted; \
                 receive them, call skip_received_actions, or turn exhaustivity off",
                leftover
            );
        }
    }
}
