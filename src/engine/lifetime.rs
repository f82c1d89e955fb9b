use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// End-of-life signal shared by a store's unkeyed effect tasks.
#[derive(Clone)]
pub(crate) struct Lifetime {
    ended: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Lifetime {
    pub(crate) fn new() -> Self {
        Self {
            ended: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Returns `true` only for the call that actually ended the lifetime.
    pub(crate) fn end(&self) -> bool {
        if self.ended.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub(crate) async fn ended(&self) {
        // Register with Notify before checking the flag so an end() racing
        // between the check and the await is not lost.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_ended() {
            return;
        }
        notified.await;
    }
}
