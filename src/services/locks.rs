//! Keyed locks serializing writes to the same tag.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// One async mutex per tag, created on demand and dropped when unused.
#[derive(Clone, Default)]
pub struct TagLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one tag's write.
pub struct TagGuard {
    tag: String,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TagLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `tag`.
    pub async fn lock(&self, tag: &str) -> TagGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(tag.to_string()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        TagGuard {
            tag: tag.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of tags with a live lock.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TagGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map still references the mutex: nobody is waiting.
        if locks
            .get(&self.tag)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.tag);
        }
    }
}
