//! Cancellation keys.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier under which keyed effects are registered.
///
/// Keys are scoped to one store. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelKey(Arc<str>);

impl CancelKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CancelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CancelKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CancelKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<&CancelKey> for CancelKey {
    fn from(key: &CancelKey) -> Self {
        key.clone()
    }
}

impl Borrow<str> for CancelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CancelKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for CancelKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
