//! The dispatch capability handed to effect executors.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one keyed registration.
///
/// Once cancelled it never resets.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CancelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelFlag").field(&self.is_cancelled()).finish()
    }
}

type Sink<A> = Arc<dyn Fn(A) + Send + Sync>;
type DismissFn = Arc<dyn Fn() + Send + Sync>;

/// Capability to feed actions back into the store that started an effect.
///
/// Dispatches are fire-and-forget from the caller's side. A dispatch handed
/// to a keyed effect is guarded: once that registration is superseded or
/// cancelled, further sends are dropped.
pub struct Dispatch<A> {
    sink: Sink<A>,
    guard: Option<CancelFlag>,
    dismiss: Option<DismissFn>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            guard: self.guard.clone(),
            dismiss: self.dismiss.clone(),
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("guard", &self.guard)
            .field("can_dismiss", &self.dismiss.is_some())
            .finish()
    }
}

impl<A: 'static> Dispatch<A> {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            guard: None,
            dismiss: None,
        }
    }

    /// Send an action. Dropped silently if the owning registration is gone.
    pub fn send(&self, action: A) {
        if self.is_cancelled() {
            tracing::trace!("dispatch from cancelled effect dropped");
            return;
        }
        (self.sink)(action);
    }

    /// True once the keyed registration this dispatch belongs to was torn down.
    pub fn is_cancelled(&self) -> bool {
        self.guard.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Ask the presenting parent to dismiss this child.
    ///
    /// Returns `false` when no presentation context injected a dismiss
    /// capability, or when the effect was already cancelled.
    pub fn dismiss(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match &self.dismiss {
            Some(dismiss) => {
                dismiss();
                true
            }
            None => {
                tracing::warn!("dismiss requested outside of a presented child");
                false
            }
        }
    }

    /// Derive a dispatch for a child action vocabulary.
    ///
    /// Every child action is wrapped with `lift` and sent through `self`.
    /// The guard and the dismiss capability are inherited.
    pub fn map<B, F>(&self, lift: F) -> Dispatch<B>
    where
        B: 'static,
        F: Fn(B) -> A + Send + Sync + 'static,
    {
        let parent = self.clone();
        Dispatch {
            sink: Arc::new(move |action| parent.send(lift(action))),
            guard: self.guard.clone(),
            dismiss: self.dismiss.clone(),
        }
    }

    pub(crate) fn guarded(&self, flag: CancelFlag) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            guard: Some(flag),
            dismiss: self.dismiss.clone(),
        }
    }

    pub(crate) fn with_dismiss<F>(mut self, dismiss: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dismiss = Some(Arc::new(dismiss));
        self
    }
}
