//! Process-local blob handle registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

const HANDLE_PREFIX: &str = "blob:medialib/";

/// Maps live `blob:` handles to the id of the record they dereference to.
///
/// A handle is only meaningful inside the process that minted or registered
/// it. Revoking a handle makes every later lookup through it fail, which is
/// how deleted or superseded blobs stop being reachable.
#[derive(Debug, Clone, Default)]
pub struct BlobHandles {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl BlobHandles {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, unregistered handle URL.
    pub fn mint() -> String {
        format!("{}{}", HANDLE_PREFIX, Uuid::new_v4())
    }

    /// Make `url` dereference to the record `id`.
    pub fn register(&self, url: impl Into<String>, id: impl Into<String>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(url.into(), id.into());
    }

    /// Record id behind a live handle.
    pub fn resolve(&self, url: &str) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(url).cloned()
    }

    /// Invalidate a handle. Returns false if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = map.remove(url).is_some();
        if removed {
            tracing::debug!(url, "Revoked blob handle");
        }
        removed
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no handle is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_resolve_revoke() {
        let handles = BlobHandles::new();
        let url = BlobHandles::mint();
        assert!(url.starts_with("blob:"));
        assert_eq!(handles.resolve(&url), None);

        handles.register(url.clone(), "uploads/a.png");
        assert_eq!(handles.resolve(&url).as_deref(), Some("uploads/a.png"));

        assert!(handles.revoke(&url));
        assert!(!handles.revoke(&url));
        assert!(handles.is_empty());
    }
}
