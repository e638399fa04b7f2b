//! Session provider port - push notifications of sign-in state

use std::fmt;
use std::sync::Arc;

use crate::domain::Session;

/// Callback receiving the current session, or `None` when signed out
pub type SessionListener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Push-based source of authentication state
///
/// A new subscriber receives the current state as soon as it is known, then
/// every later change, until its `Subscription` is dropped.
pub trait SessionProvider: Send + Sync {
    fn subscribe(&self, listener: SessionListener) -> Subscription;
}

/// Registration handle; dropping it releases the listener
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Handle with nothing to release
    pub fn detached() -> Self {
        Self { release: None }
    }

    /// Release now instead of on drop
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
