use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use interview_core::model::SessionId;

/// One async mutex per session so submissions for a session serialize while
/// different sessions proceed fully in parallel.
///
/// The registry mutex is held only to look up or insert an entry, never
/// across an await; the per-session guard is what spans the oracle round
/// trip.
#[derive(Clone, Default)]
pub(crate) struct SessionLocks {
    inner: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>,
}

impl SessionLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquire the submission lock for a session. The guard releases on
    /// drop, covering every exit path.
    pub(crate) async fn acquire(&self, session: SessionId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(map.entry(session).or_default())
        };
        entry.lock_owned().await
    }
}
