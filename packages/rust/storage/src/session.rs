//! Session identity: one stable identifier per persisted store.

use nuru_shared::{SESSION_STORAGE_KEY, SessionId};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::KeyValueStore;

/// Produces the session identifier for one widget view.
///
/// The first call reads the store and, if nothing is there, generates and
/// persists a new identifier. Every later call returns the cached value
/// without touching the store. Store failures never surface: the view keeps
/// working with an identifier that lives only in memory.
pub struct SessionManager<S> {
    store: S,
    cached: OnceCell<SessionId>,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached: OnceCell::new(),
        }
    }

    /// The session identifier for this view.
    pub async fn session_id(&self) -> SessionId {
        self.cached
            .get_or_init(|| self.load_or_create())
            .await
            .clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_or_create(&self) -> SessionId {
        match self.store.get(SESSION_STORAGE_KEY).await {
            Ok(Some(existing)) if !existing.is_empty() => {
                debug!(session_id = %existing, "reusing persisted session id");
                return SessionId::from(existing);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not read persisted session id"),
        }

        let id = SessionId::generate();
        match self.store.set(SESSION_STORAGE_KEY, id.as_str()).await {
            Ok(()) => debug!(session_id = %id, "created session id"),
            Err(e) => warn!(error = %e, session_id = %id, "session id kept in memory only"),
        }
        id
    }
}
