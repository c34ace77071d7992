//! Shared session state.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex, MutexGuard};

use super::{Session, TokenStore};

/// Coarse session state for route guards and status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Initial store read has not completed
    Loading,
    /// No session
    Anonymous,
    /// Token pair present
    Authenticated,
}

#[derive(Debug)]
struct State {
    session: Option<Session>,
    loading: bool,
}

struct Inner {
    store: Box<dyn TokenStore>,
    state: RwLock<State>,
    /// Serializes refresh exchanges across every client sharing this handle.
    refresh_gate: Mutex<()>,
}

/// Cloneable handle to the session owned by the session manager.
///
/// All clones observe the same state. Writers keep the token store and the
/// in-memory state in step: the store is written while the state lock is
/// held.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Creates a handle in the loading state. Call [`Self::load_from_store`]
    /// to finish startup.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Box::new(store),
                state: RwLock::new(State {
                    session: None,
                    loading: true,
                }),
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    /// Creates a handle and reads any persisted session.
    pub fn initialize(store: impl TokenStore + 'static) -> Self {
        let handle = Self::new(store);
        handle.load_from_store();
        handle
    }

    /// Reads the persisted session and clears the loading flag.
    ///
    /// An unreadable store is treated as "no session".
    pub fn load_from_store(&self) {
        let loaded = match self.inner.store.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session store: {e:#}");
                None
            }
        };

        let mut state = self.write();
        tracing::debug!(present = loaded.is_some(), "session loaded from store");
        state.session = loaded;
        state.loading = false;
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.read();
        if state.loading {
            SessionStatus::Loading
        } else if state.session.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().session.is_some()
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Option<Session> {
        self.read().session.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Stores a new session, replacing any previous one.
    ///
    /// A store write failure is logged; the in-memory session still applies.
    pub fn establish(&self, session: Session) {
        let mut state = self.write();
        if let Err(e) = self
            .inner
            .store
            .save(&session.access_token, &session.refresh_token)
        {
            tracing::warn!("Failed to persist session: {e:#}");
        }
        tracing::info!("session established");
        state.session = Some(session);
        state.loading = false;
    }

    /// Replaces the access token in place, and the refresh token too when
    /// the server rotated it.
    ///
    /// Only applies when the current session still holds `used_refresh`,
    /// so a refresh racing with logout or a new login cannot overwrite it.
    /// Returns whether the session was updated.
    pub fn replace_access_token(
        &self,
        used_refresh: &str,
        access_token: String,
        rotated_refresh: Option<String>,
    ) -> bool {
        let mut state = self.write();
        let Some(session) = state.session.as_mut() else {
            return false;
        };
        if session.refresh_token != used_refresh {
            return false;
        }

        session.access_token = access_token;
        if let Some(refresh) = rotated_refresh {
            session.refresh_token = refresh;
        }
        if let Err(e) = self
            .inner
            .store
            .save(&session.access_token, &session.refresh_token)
        {
            tracing::warn!("Failed to persist refreshed token: {e:#}");
        }
        tracing::debug!("access token replaced");
        true
    }

    /// Clears the store and the session. Never fails.
    pub fn logout(&self) {
        let mut state = self.write();
        if let Err(e) = self.inner.store.clear() {
            tracing::warn!("Failed to clear session store: {e:#}");
        }
        if state.session.take().is_some() {
            tracing::info!("session cleared");
        }
        state.loading = false;
    }

    /// Waits for exclusive use of the refresh exchange.
    pub(crate) async fn refresh_gate(&self) -> MutexGuard<'_, ()> {
        self.inner.refresh_gate.lock().await
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
