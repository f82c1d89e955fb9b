//! Effect failures and the error hook they are reported through.
//!
//! Failures inside executors never reach the store or the dispatching
//! caller. They are caught at the engine boundary and handed to a hook:
//! the store's own hook if one was configured, otherwise the process-wide
//! hook, otherwise a `tracing::error!` line.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::effect::{CancelKey, EffectFamily};

/// Failure raised by an effect executor or subscription closure.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("{family} effect{} failed: {source:#}", key_label(.key))]
    Failed {
        family: EffectFamily,
        key: Option<CancelKey>,
        #[source]
        source: anyhow::Error,
    },

    #[error("{family} effect{} panicked: {message}", key_label(.key))]
    Panicked {
        family: EffectFamily,
        key: Option<CancelKey>,
        message: String,
    },

    #[error("subscription '{key}' setup panicked: {message}")]
    SetupPanicked { key: CancelKey, message: String },

    #[error("subscription '{key}' cleanup panicked: {message}")]
    CleanupPanicked { key: CancelKey, message: String },
}

impl EffectError {
    pub fn family(&self) -> EffectFamily {
        match self {
            EffectError::Failed { family, .. } | EffectError::Panicked { family, .. } => *family,
            EffectError::SetupPanicked { .. } | EffectError::CleanupPanicked { .. } => {
                EffectFamily::Subscription
            }
        }
    }

    pub fn key(&self) -> Option<&CancelKey> {
        match self {
            EffectError::Failed { key, .. } | EffectError::Panicked { key, .. } => key.as_ref(),
            EffectError::SetupPanicked { key, .. } | EffectError::CleanupPanicked { key, .. } => {
                Some(key)
            }
        }
    }
}

fn key_label(key: &Option<CancelKey>) -> String {
    match key {
        Some(key) => format!(" '{}'", key),
        None => String::new(),
    }
}

/// Callback receiving every effect failure.
pub type ErrorHook = Arc<dyn Fn(&EffectError) + Send + Sync>;

static GLOBAL_HOOK: RwLock<Option<ErrorHook>> = parking_lot::const_rwlock(None);

/// Install the process-wide error hook.
///
/// Stores created with their own hook in [`crate::StoreOptions`] ignore it.
pub fn set_error_hook<F>(hook: F)
where
    F: Fn(&EffectError) + Send + Sync + 'static,
{
    *GLOBAL_HOOK.write() = Some(Arc::new(hook));
}

/// Restore the default hook (log and continue).
pub fn reset_error_hook() {
    *GLOBAL_HOOK.write() = None;
}

pub(crate) fn report(local: Option<&ErrorHook>, error: EffectError) {
    if let Some(hook) = local {
        hook(&error);
        return;
    }
    let global = GLOBAL_HOOK.read().clone();
    match global {
        Some(hook) => hook(&error),
        None => tracing::error!(error = %error, "Effect failed"),
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
