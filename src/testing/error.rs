use std::time::Duration;

use thiserror::Error;

/// Assertion failure raised by [`super::TestStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestStoreError {
    #[error("expected an action from an effect within {timeout:?}, but none arrived")]
    ReceiveTimeout { timeout: Duration },

    #[error("expected to receive {expected}, but received {received}")]
    UnexpectedAction { expected: String, received: String },

    #[error("{count} action(s) from effects were never asserted: [{}]", actions.join(", "))]
    PendingActions { count: usize, actions: Vec<String> },
}
