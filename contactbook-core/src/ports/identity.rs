//! Identity provider port - credential exchange and token refresh

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Session;

/// Issues sessions for credentials
///
/// The session provider uses this to sign users in and to renew expired
/// tokens without knowing which identity service sits behind it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name (e.g., "firebase", "demo")
    fn name(&self) -> &str;

    /// Exchange email and password for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Renew an expired session using its refresh token
    async fn refresh(&self, session: &Session) -> Result<Session>;
}
