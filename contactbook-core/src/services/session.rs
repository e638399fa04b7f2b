//! Session service - the local session provider
//!
//! `SessionHub` keeps the listener registry and the last published state.
//! `LocalSessionProvider` backs it with `session.json` in the contactbook
//! directory and an identity provider for sign-in and token refresh.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use crate::domain::result::{Error, Result};
use crate::domain::Session;
use crate::ports::{IdentityProvider, SessionListener, SessionProvider, Subscription};

const SESSION_FILE: &str = "session.json";

#[derive(Default)]
struct HubState {
    listeners: BTreeMap<u64, SessionListener>,
    next_id: u64,
    /// None until the first publish
    current: Option<Option<Session>>,
}

/// Listener registry that pushes session changes
///
/// Subscribers that join after the state is known are notified at once.
/// Callbacks run outside the registry lock, so a listener may subscribe or
/// unsubscribe from inside its callback.
#[derive(Clone, Default)]
pub struct SessionHub {
    inner: Arc<Mutex<HubState>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `session` as the current state and notify every listener
    pub fn publish(&self, session: Option<Session>) {
        let listeners: Vec<SessionListener> = match self.inner.lock() {
            Ok(mut state) => {
                state.current = Some(session.clone());
                state.listeners.values().cloned().collect()
            }
            Err(_) => return,
        };
        for listener in listeners {
            listener(session.as_ref());
        }
    }

    /// Last published state; `None` while still unknown
    pub fn known_state(&self) -> Option<Option<Session>> {
        self.inner.lock().ok().and_then(|state| state.current.clone())
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|state| state.listeners.len()).unwrap_or(0)
    }
}

fn remove_listener(inner: &Weak<Mutex<HubState>>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        if let Ok(mut state) = inner.lock() {
            state.listeners.remove(&id);
        }
    }
}

impl SessionProvider for SessionHub {
    fn subscribe(&self, listener: SessionListener) -> Subscription {
        let (id, current) = match self.inner.lock() {
            Ok(mut state) => {
                let id = state.next_id;
                state.next_id += 1;
                state.listeners.insert(id, Arc::clone(&listener));
                (id, state.current.clone())
            }
            Err(_) => return Subscription::detached(),
        };

        if let Some(session) = current {
            listener(session.as_ref());
        }

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || remove_listener(&weak, id))
    }
}

/// Session provider persisted to `session.json`
pub struct LocalSessionProvider {
    hub: SessionHub,
    identity: Arc<dyn IdentityProvider>,
    session_path: PathBuf,
}

impl LocalSessionProvider {
    pub fn new(contactbook_dir: &Path, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            hub: SessionHub::new(),
            identity,
            session_path: contactbook_dir.join(SESSION_FILE),
        }
    }

    pub fn identity_name(&self) -> &str {
        self.identity.name()
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    /// Current session, if one has been resolved
    pub fn current(&self) -> Option<Session> {
        self.hub.known_state().flatten()
    }

    /// Load the stored session, renewing it when expired, and publish the result
    ///
    /// A session issued by another identity provider (demo mode switched
    /// since sign-in) is dropped. A refresh the identity service refuses
    /// drops the stored session too. A refresh that fails on the network
    /// publishes "signed out" for this run but keeps the file, and the error
    /// is returned.
    pub async fn resolve(&self) -> Result<Option<Session>> {
        let stored = match self.read_session() {
            Ok(stored) => stored,
            Err(e) => {
                self.hub.publish(None);
                return Err(e);
            }
        };

        let stored = match stored {
            Some(session) if session.issuer != self.identity.name() => {
                self.remove_session()?;
                None
            }
            other => other,
        };

        let session = match stored {
            Some(session) if session.is_expired() => {
                match self.identity.refresh(&session).await {
                    Ok(renewed) => {
                        let renewed = renewed.issued_by(self.identity.name());
                        self.write_session(&renewed)?;
                        Some(renewed)
                    }
                    Err(e) if e.is_retryable() => {
                        self.hub.publish(None);
                        return Err(e);
                    }
                    Err(_) => {
                        self.remove_session()?;
                        None
                    }
                }
            }
            other => other,
        };

        self.hub.publish(session.clone());
        Ok(session)
    }

    /// Exchange credentials for a session, store it and publish it
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .identity
            .sign_in(email, password)
            .await?
            .issued_by(self.identity.name());
        self.write_session(&session)?;
        self.hub.publish(Some(session.clone()));
        Ok(session)
    }

    /// Forget the stored session and publish "signed out"
    pub fn sign_out(&self) -> Result<()> {
        self.remove_session()?;
        self.hub.publish(None);
        Ok(())
    }

    fn read_session(&self) -> Result<Option<Session>> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.session_path)?;
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // An unreadable session is as good as none; remove it so login can rewrite it
                self.remove_session()?;
                Err(Error::Auth(format!(
                    "stored session was unreadable and has been removed: {}",
                    e
                )))
            }
        }
    }

    fn write_session(&self, session: &Session) -> Result<()> {
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.session_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.session_path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove_session(&self) -> Result<()> {
        if self.session_path.exists() {
            std::fs::remove_file(&self.session_path)?;
        }
        Ok(())
    }
}

impl SessionProvider for LocalSessionProvider {
    fn subscribe(&self, listener: SessionListener) -> Subscription {
        self.hub.subscribe(listener)
    }
}
