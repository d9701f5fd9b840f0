//! Ownership of the access/refresh token pair.
//!
//! The in-memory slot is the source of truth: every reader observes a write as soon as
//! [`SessionStore::set`], [`SessionStore::rotate`] or [`SessionStore::clear`] is called. The
//! persisted copy is written afterwards so a restarted process can [`SessionStore::restore`] it.
//! Writers are serialized until their persisted copy lands, so storage always ends up matching the
//! last in-memory write.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};

use storefront_state::{Setting, SettingItem, register_setting_key, repository::Repository};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

register_setting_key!(const ACCESS_TOKEN: String = "access_token");
register_setting_key!(const REFRESH_TOKEN: String = "refresh_token");

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token attached to authenticated requests.
    pub access_token: String,
    /// Token used to obtain a new access token once the current one is rejected.
    pub refresh_token: Option<String>,
}

impl Session {
    #[allow(missing_docs)]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Stores the current [`Session`] and broadcasts whether one is present.
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    /// Held from the in-memory swap until the write is persisted.
    writes: Mutex<()>,
    signal: watch::Sender<bool>,
    generation: AtomicU64,
    access: Setting<String>,
    refresh: Setting<String>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store persisting into `repository`.
    pub fn new(repository: Arc<dyn Repository<SettingItem>>) -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            current: RwLock::new(None),
            writes: Mutex::new(()),
            signal,
            generation: AtomicU64::new(0),
            access: Setting::new(Arc::clone(&repository), ACCESS_TOKEN),
            refresh: Setting::new(repository, REFRESH_TOKEN),
        }
    }

    /// Load a previously persisted session, if any, into memory.
    ///
    /// Storage failures are logged and treated as "no session".
    pub async fn restore(&self) -> Option<Session> {
        let _writes = self.writes.lock().await;
        let access_token = match self.access.get().await {
            Ok(token) => token?,
            Err(e) => {
                warn!("Failed to load persisted access token: {e}");
                return None;
            }
        };
        let refresh_token = self.refresh.get().await.unwrap_or_else(|e| {
            warn!("Failed to load persisted refresh token: {e}");
            None
        });

        let session = Session {
            access_token,
            refresh_token,
        };
        self.replace(Some(session.clone()));
        debug!("Session restored from storage");
        Some(session)
    }

    /// The current session, if authenticated.
    pub fn get(&self) -> Option<Session> {
        self.current
            .read()
            .expect("RwLock is not poisoned")
            .clone()
    }

    /// The current access token, if authenticated.
    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .expect("RwLock is not poisoned")
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// The current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .expect("RwLock is not poisoned")
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
    }

    #[allow(missing_docs)]
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .expect("RwLock is not poisoned")
            .is_some()
    }

    /// Subscribe to the authentication signal. The value is `true` while a session is present and
    /// only changes on an absent/present transition, never on token rotation.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    /// Number of sessions started so far. Bumped on every absent to present transition, before
    /// the signal is published.
    ///
    /// The signal keeps only the latest value, so a logout directly followed by a login can reach
    /// a slow observer as `true` twice. Comparing generations tells that apart from nothing
    /// having happened.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the session, e.g. after a login.
    pub async fn set(&self, session: Session) {
        let _writes = self.writes.lock().await;
        self.replace(Some(session.clone()));
        self.persist(Some(&session)).await;
    }

    /// Store a renewed access token, and the rotated refresh token when the server issued one.
    ///
    /// Returns `false` without storing anything when the session was cleared in the meantime, so
    /// a renewal racing a logout can't resurrect the session.
    pub async fn rotate(&self, access_token: String, refresh_token: Option<String>) -> bool {
        let _writes = self.writes.lock().await;
        let session = {
            let mut current = self.current.write().expect("RwLock is not poisoned");
            let Some(session) = current.as_mut() else {
                return false;
            };
            session.access_token = access_token;
            if refresh_token.is_some() {
                session.refresh_token = refresh_token;
            }
            session.clone()
        };
        self.persist(Some(&session)).await;
        true
    }

    /// Store a renewed access token, keeping the current refresh token.
    pub async fn set_access_token(&self, access_token: String) -> bool {
        self.rotate(access_token, None).await
    }

    /// Drop the session. Consumers observing [`SessionStore::subscribe`] must force the user to
    /// authenticate again.
    pub async fn clear(&self) {
        let _writes = self.writes.lock().await;
        if self.replace(None) {
            info!("Session cleared");
        }
        self.persist(None).await;
    }

    /// Swap the in-memory session, returning whether one was present before.
    fn replace(&self, session: Option<Session>) -> bool {
        let authenticated = session.is_some();
        let previous = std::mem::replace(
            &mut *self.current.write().expect("RwLock is not poisoned"),
            session,
        );
        self.signal.send_if_modified(|value| {
            let changed = *value != authenticated;
            if changed && authenticated {
                self.generation.fetch_add(1, Ordering::AcqRel);
            }
            *value = authenticated;
            changed
        });
        previous.is_some()
    }

    async fn persist(&self, session: Option<&Session>) {
        let result = match session {
            Some(session) => {
                let refresh = match &session.refresh_token {
                    Some(token) => self.refresh.update(token.clone()).await,
                    None => self.refresh.delete().await,
                };
                match refresh {
                    Ok(()) => self.access.update(session.access_token.clone()).await,
                    Err(e) => Err(e),
                }
            }
            None => match self.access.delete().await {
                Ok(()) => self.refresh.delete().await,
                Err(e) => Err(e),
            },
        };

        if let Err(e) = result {
            warn!("Failed to persist session: {e}");
        }
    }
}
