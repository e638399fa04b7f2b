//! Auth gate - guards contact operations behind a confirmed session
//!
//! The gate subscribes to a session provider on mount and settles on the
//! first notification it receives. It never polls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::result::{Error, Result};
use crate::domain::Session;
use crate::ports::{SessionListener, SessionProvider, Subscription};

/// Where unauthenticated users are sent
pub const LOGIN_ENTRY_POINT: &str = "cb login";

/// Resolution state for one mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No notification received yet
    Pending,
    Authenticated,
    Unauthenticated,
}

/// What the guarded surface should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show a loading placeholder; grant no access
    Placeholder,
    Allow,
    /// Send the user to the login entry point
    Redirect,
}

impl GateState {
    pub fn decision(self) -> GateDecision {
        match self {
            GateState::Pending => GateDecision::Placeholder,
            GateState::Authenticated => GateDecision::Allow,
            GateState::Unauthenticated => GateDecision::Redirect,
        }
    }
}

/// Gate over protected content
pub struct AuthGate {
    state: Arc<watch::Sender<GateState>>,
    subscription: Option<Subscription>,
}

impl AuthGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Pending);
        Self {
            state: Arc::new(state),
            subscription: None,
        }
    }

    /// Start observing the provider with a fresh `Pending` state
    ///
    /// Mounting again releases the previous subscription first.
    pub fn mount(&mut self, provider: &dyn SessionProvider) {
        self.unmount();

        // Each mount gets its own channel so a late callback from an earlier
        // mount cannot resolve this one
        let (state, _) = watch::channel(GateState::Pending);
        let state = Arc::new(state);
        self.state = Arc::clone(&state);

        let listener: SessionListener = Arc::new(move |session: Option<&Session>| {
            state.send_if_modified(|current| {
                if *current != GateState::Pending {
                    return false;
                }
                *current = if session.is_some() {
                    GateState::Authenticated
                } else {
                    GateState::Unauthenticated
                };
                true
            });
        });
        self.subscription = Some(provider.subscribe(listener));
    }

    /// Release the provider subscription
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    pub fn decision(&self) -> GateDecision {
        self.state().decision()
    }

    /// Wait until the gate resolves or `timeout` passes
    ///
    /// A timeout is reported as an error; the gate itself stays `Pending`.
    pub async fn resolved(&self, timeout: Duration) -> Result<GateState> {
        let mut rx = self.state.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(|state| *state != GateState::Pending)
                .await
                .map(|state| *state)
        })
        .await;

        match waited {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_)) => Err(Error::Auth("session state is no longer observed".to_string())),
            Err(_) => Err(Error::Auth(format!(
                "timed out after {}s waiting for the session state",
                timeout.as_secs_f32()
            ))),
        }
    }

    /// Ok when access is allowed, otherwise an error pointing at the login command
    pub fn require_access(&self) -> Result<()> {
        match self.decision() {
            GateDecision::Allow => Ok(()),
            GateDecision::Redirect => Err(Error::Auth(format!(
                "not signed in. Run '{}' first",
                LOGIN_ENTRY_POINT
            ))),
            GateDecision::Placeholder => {
                Err(Error::Auth("session state is not known yet".to_string()))
            }
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SessionHub;

    #[test]
    fn test_pending_until_first_notification() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);
        assert_eq!(gate.state(), GateState::Pending);
        assert_eq!(gate.decision(), GateDecision::Placeholder);
        assert!(gate.require_access().is_err());

        hub.publish(Some(Session::local("u1", "a@b.c")));
        assert_eq!(gate.decision(), GateDecision::Allow);
        assert!(gate.require_access().is_ok());
    }

    #[test]
    fn test_first_notification_is_terminal() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);

        hub.publish(None);
        hub.publish(Some(Session::local("u1", "a@b.c")));
        assert_eq!(gate.state(), GateState::Unauthenticated);
        assert_eq!(gate.decision(), GateDecision::Redirect);
    }

    #[test]
    fn test_remount_starts_fresh() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);
        hub.publish(None);

        hub.publish(Some(Session::local("u1", "a@b.c")));
        gate.mount(&hub);
        // The hub already knows the state, so the new mount resolves at once
        assert_eq!(gate.state(), GateState::Authenticated);
        assert_eq!(hub.listener_count(), 1);
    }

    #[test]
    fn test_unmount_releases_listener() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);
        assert_eq!(hub.listener_count(), 1);

        gate.unmount();
        assert!(!gate.is_mounted());
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_drop_releases_listener() {
        let hub = SessionHub::new();
        {
            let mut gate = AuthGate::new();
            gate.mount(&hub);
            assert_eq!(hub.listener_count(), 1);
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_resolved_waits_for_notification() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);

        let publisher = hub.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish(Some(Session::local("u1", "a@b.c")));
        });

        let state = gate.resolved(Duration::from_secs(5)).await.unwrap();
        assert_eq!(state, GateState::Authenticated);
    }

    #[tokio::test]
    async fn test_resolved_times_out_while_pending() {
        let hub = SessionHub::new();
        let mut gate = AuthGate::new();
        gate.mount(&hub);

        let err = gate.resolved(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(gate.state(), GateState::Pending);
    }
}
