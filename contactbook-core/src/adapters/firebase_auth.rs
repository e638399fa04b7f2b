//! Firebase Authentication identity provider
//!
//! Email/password sign-in goes through the Identity Toolkit REST API and
//! token renewal through the Secure Token API.
//!
//! API Documentation: https://firebase.google.com/docs/reference/rest/auth

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::FirebaseSettings;
use crate::domain::result::{Error, RemoteErrorKind, RemoteOperation, Result};
use crate::domain::{Session, TokenClaims};
use crate::ports::IdentityProvider;

/// Default production API URLs
const AUTH_PRODUCTION_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const TOKEN_PRODUCTION_URL: &str = "https://securetoken.googleapis.com/v1";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    /// Seconds, as a decimal string
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Firebase Auth REST client
#[derive(Debug)]
pub struct FirebaseAuthClient {
    client: Client,
    api_key: String,
    auth_url: String,
    token_url: String,
}

impl FirebaseAuthClient {
    /// Create a client from settings; the API key is required
    pub fn new(settings: &FirebaseSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Self::new_with_base_urls(
            api_key,
            settings.auth_url.as_deref().unwrap_or(AUTH_PRODUCTION_URL),
            settings.token_url.as_deref().unwrap_or(TOKEN_PRODUCTION_URL),
        )
    }

    /// Create a client against custom endpoints (emulator or mock server)
    pub fn new_with_base_urls(api_key: &str, auth_url: &str, token_url: &str) -> Result<Self> {
        for url in [auth_url, token_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "Auth URL must use http or https, got '{}'",
                    url
                )));
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            token_url: token_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check_response(
        op: RemoteOperation,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", code));

        // The auth API reports bad credentials as 400 with a code in the message
        let credential_codes = [
            "INVALID_LOGIN_CREDENTIALS",
            "INVALID_PASSWORD",
            "EMAIL_NOT_FOUND",
            "USER_DISABLED",
            "INVALID_REFRESH_TOKEN",
            "TOKEN_EXPIRED",
            "USER_NOT_FOUND",
            "INVALID_EMAIL",
        ];
        if credential_codes.iter().any(|c| message.starts_with(c)) {
            return Err(Error::Auth(describe_auth_code(&message)));
        }

        Err(Error::remote(op, RemoteErrorKind::from_status(code), message))
    }
}

fn map_request_error(op: RemoteOperation, error: reqwest::Error) -> Error {
    if error.is_timeout() || error.is_connect() {
        Error::remote(op, RemoteErrorKind::Transient, "unable to reach the authentication service")
    } else {
        Error::remote(op, RemoteErrorKind::Rejected, format!("authentication request failed: {}", error))
    }
}

fn describe_auth_code(code: &str) -> String {
    let text = match code.split([' ', ':']).next().unwrap_or(code) {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            "invalid email or password"
        }
        "INVALID_EMAIL" => "the email address is badly formatted",
        "USER_DISABLED" => "this account has been disabled",
        "USER_NOT_FOUND" => "this account no longer exists",
        _ => "your session has expired, please sign in again",
    };
    text.to_string()
}

fn parse_expires_in(op: RemoteOperation, value: &str) -> Result<chrono::Duration> {
    value
        .trim()
        .parse::<i64>()
        .map(chrono::Duration::seconds)
        .map_err(|_| {
            Error::remote(op, RemoteErrorKind::Rejected, format!("invalid expiresIn '{}'", value))
        })
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let op = RemoteOperation::SignIn;
        let url = format!("{}/accounts:signInWithPassword", self.auth_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| map_request_error(op, e))?;

        let body: SignInResponse = Self::check_response(op, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::remote(op, RemoteErrorKind::Rejected, e.to_string()))?;

        let expires_at = Utc::now() + parse_expires_in(op, &body.expires_in)?;
        Ok(Session {
            uid: body.local_id,
            email: body.email.unwrap_or_else(|| email.to_string()),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Some(expires_at),
            issuer: String::new(),
        })
    }

    async fn refresh(&self, session: &Session) -> Result<Session> {
        let op = RemoteOperation::Refresh;
        if !session.can_refresh() {
            return Err(Error::Auth("session has no refresh token".to_string()));
        }

        let url = format!("{}/token", self.token_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| map_request_error(op, e))?;

        let body: RefreshResponse = Self::check_response(op, response)
            .await?
            .json()
            .await
            .map_err(|e| Error::remote(op, RemoteErrorKind::Rejected, e.to_string()))?;

        let claims = TokenClaims::decode(&body.id_token).unwrap_or_default();
        let expires_at = match claims.expires_at() {
            Some(expires_at) => expires_at,
            None => Utc::now() + parse_expires_in(op, &body.expires_in)?,
        };
        Ok(Session {
            uid: body.user_id.unwrap_or_else(|| session.uid.clone()),
            email: session.email.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Some(expires_at),
            issuer: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::firebase_mock::{MockConfig, MockFirestoreServer};

    fn client_for(server: &MockFirestoreServer) -> FirebaseAuthClient {
        let base = format!("{}/v1", server.base_url());
        FirebaseAuthClient::new_with_base_urls("test-key", &base, &base).unwrap()
    }

    #[test]
    fn test_api_key_required() {
        let result = FirebaseAuthClient::new(&FirebaseSettings::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = FirebaseAuthClient::new_with_base_urls("k", "file:///tmp", "https://x");
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_codes_are_readable() {
        assert_eq!(describe_auth_code("INVALID_PASSWORD"), "invalid email or password");
        assert_eq!(
            describe_auth_code("TOKEN_EXPIRED"),
            "your session has expired, please sign in again"
        );
    }

    #[tokio::test]
    async fn test_sign_in_issues_session() {
        let server = MockFirestoreServer::start(MockConfig::default()).unwrap();
        let client = client_for(&server);

        let session = client.sign_in("ada@example.com", "correct-horse").await.unwrap();
        assert_eq!(session.uid, "uid-ada");
        assert_eq!(session.email, "ada@example.com");
        assert!(session.can_refresh());
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_wrong_password_is_auth_error() {
        let server = MockFirestoreServer::start(MockConfig::default()).unwrap();
        let client = client_for(&server);

        let err = client.sign_in("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m == "invalid email or password"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_identity() {
        let server = MockFirestoreServer::start(MockConfig::default()).unwrap();
        let client = client_for(&server);

        let session = client.sign_in("ada@example.com", "correct-horse").await.unwrap();
        let refreshed = client.refresh(&session).await.unwrap();
        assert_eq!(refreshed.uid, session.uid);
        assert_eq!(refreshed.email, session.email);
        assert!(refreshed.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_with_bad_token_fails() {
        let server = MockFirestoreServer::start(MockConfig::default()).unwrap();
        let client = client_for(&server);

        let mut session = Session::local("u1", "a@b.c");
        session.refresh_token = "bogus".to_string();
        let err = client.refresh(&session).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_unavailable_service_is_transient() {
        let server = MockFirestoreServer::start(MockConfig {
            fail_status: Some(503),
            ..MockConfig::default()
        })
        .unwrap();
        let client = client_for(&server);

        let err = client.sign_in("ada@example.com", "correct-horse").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
