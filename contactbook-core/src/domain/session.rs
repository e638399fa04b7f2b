//! Session domain model

use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Tokens are treated as expired this long before their real expiry
const EXPIRY_SKEW_SECS: i64 = 60;

/// A signed-in user as stored in `session.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    /// Bearer token for document store requests; empty for local sessions
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// None means the session never expires (demo mode)
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Identity provider that issued the session (`IdentityProvider::name`)
    #[serde(default)]
    pub issuer: String,
}

impl Session {
    /// Session that never expires and carries no tokens
    pub fn local(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at: None,
            issuer: String::new(),
        }
    }

    /// Same session, marked as issued by `issuer`
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expires_at,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Subset of the identity token's claims
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Read the payload segment of a JWT without verifying it
    ///
    /// Verification belongs to the services that accept the token.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    pub fn uid(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.sub.as_deref())
    }
}
