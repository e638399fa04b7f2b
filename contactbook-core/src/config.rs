//! Configuration management
//!
//! Settings live in `settings.json` inside the contactbook directory:
//! ```json
//! {
//!   "app": { "demoMode": false, "sortKeyChange": "keep", "authTimeoutSecs": 10 },
//!   "firebase": { "apiKey": "...", "projectId": "...", "databaseId": "(default)" }
//! }
//! ```
//! Credentials are never compiled in. Environment variables override the
//! file, which keeps secrets out of it entirely when preferred.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::SortKeyChange;

pub const API_KEY_ENV: &str = "CONTACTBOOK_API_KEY";
pub const PROJECT_ID_ENV: &str = "CONTACTBOOK_PROJECT_ID";
pub const DEMO_MODE_ENV: &str = "CONTACTBOOK_DEMO_MODE";
/// Override for the Firestore REST base URL (emulator or mock server)
pub const FIRESTORE_URL_ENV: &str = "CONTACTBOOK_FIRESTORE_URL";
/// Override for the Firebase Auth REST base URL
pub const AUTH_URL_ENV: &str = "CONTACTBOOK_AUTH_URL";
/// Override for the secure token REST base URL
pub const TOKEN_URL_ENV: &str = "CONTACTBOOK_TOKEN_URL";

const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATABASE_ID: &str = "(default)";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    firebase: FirebaseSettingsFile,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    sort_key_change: SortKeyChange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseSettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    firestore_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Connection settings for the hosted services
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub database_id: String,
    pub firestore_url: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
}

impl FirebaseSettings {
    /// API key, or a configuration error naming how to set it
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "Firebase API key is not configured. Run 'cb setup' or set {}",
                API_KEY_ENV
            ))
        })
    }

    /// Project id, or a configuration error naming how to set it
    pub fn require_project_id(&self) -> Result<&str> {
        self.project_id.as_deref().filter(|p| !p.is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "Firebase project id is not configured. Run 'cb setup' or set {}",
                PROJECT_ID_ENV
            ))
        })
    }
}

/// Contactbook configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub demo_mode: bool,
    pub sort_key_change: SortKeyChange,
    pub auth_timeout_secs: u64,
    pub firebase: FirebaseSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            demo_mode: false,
            sort_key_change: SortKeyChange::default(),
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
            firebase: FirebaseSettings {
                database_id: DEFAULT_DATABASE_ID.to_string(),
                ..FirebaseSettings::default()
            },
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the contactbook directory
    ///
    /// A missing file yields defaults; a malformed one is an error so that
    /// credentials are never silently dropped.
    pub fn load(contactbook_dir: &Path) -> Result<Self> {
        let raw = read_settings(contactbook_dir)?;

        let demo_mode = match std::env::var(DEMO_MODE_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let file = &raw.firebase;
        let firebase = FirebaseSettings {
            api_key: env_or(API_KEY_ENV, &file.api_key),
            project_id: env_or(PROJECT_ID_ENV, &file.project_id),
            database_id: file
                .database_id
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            firestore_url: env_or(FIRESTORE_URL_ENV, &file.firestore_url),
            auth_url: env_or(AUTH_URL_ENV, &file.auth_url),
            token_url: env_or(TOKEN_URL_ENV, &file.token_url),
        };

        Ok(Self {
            demo_mode,
            sort_key_change: raw.app.sort_key_change,
            auth_timeout_secs: raw.app.auth_timeout_secs.unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS),
            firebase,
            _raw_settings: raw,
        })
    }

    /// Save config to the contactbook directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, contactbook_dir: &Path) -> Result<()> {
        let settings_path = contactbook_dir.join("settings.json");
        let mut settings = read_settings(contactbook_dir)?;

        settings.app.demo_mode = self.demo_mode;
        settings.app.sort_key_change = self.sort_key_change;
        settings.app.auth_timeout_secs = Some(self.auth_timeout_secs);
        settings.firebase.database_id = Some(self.firebase.database_id.clone());

        // Values that came from the environment are not written back
        if std::env::var(API_KEY_ENV).is_err() {
            settings.firebase.api_key = self.firebase.api_key.clone();
        }
        if std::env::var(PROJECT_ID_ENV).is_err() {
            settings.firebase.project_id = self.firebase.project_id.clone();
        }

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }

    /// Store hosted-service credentials
    pub fn set_firebase(&mut self, api_key: impl Into<String>, project_id: impl Into<String>) {
        self.firebase.api_key = Some(api_key.into());
        self.firebase.project_id = Some(project_id.into());
    }
}

fn read_settings(contactbook_dir: &Path) -> Result<SettingsFile> {
    let settings_path = contactbook_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid {}: {}", settings_path.display(), e))
    })
}

fn env_or(var: &str, fallback: &Option<String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.clone())
}
