//! Cloud Firestore document store
//!
//! Talks to the Firestore REST API. Contacts live in the `contacts`
//! collection as documents with four `stringValue` fields.
//!
//! API Documentation: https://firebase.google.com/docs/firestore/reference/rest

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::FirebaseSettings;
use crate::domain::result::{Error, RemoteErrorKind, RemoteOperation, Result};
use crate::domain::{Contact, ContactDraft, ContactFields, ContactId};
use crate::ports::{DocumentStore, LoadedContacts, CONTACTS_COLLECTION};

/// Default production API URL
const FIRESTORE_PRODUCTION_URL: &str = "https://firestore.googleapis.com/v1";

const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// REST payloads
// =============================================================================

/// Typed Firestore value; only string-ish variants are read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    /// Integers arrive as decimal strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
}

impl FirestoreValue {
    fn string(value: &str) -> Self {
        Self {
            string_value: Some(value.to_string()),
            integer_value: None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        self.string_value
            .as_deref()
            .or(self.integer_value.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Serialize)]
struct DocumentBody {
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn to_body(fields: &ContactFields) -> DocumentBody {
    let mut map = HashMap::new();
    map.insert("firstName".to_string(), FirestoreValue::string(&fields.first_name));
    map.insert("lastName".to_string(), FirestoreValue::string(&fields.last_name));
    map.insert("phoneNumber".to_string(), FirestoreValue::string(&fields.phone_number));
    map.insert("email".to_string(), FirestoreValue::string(&fields.email));
    DocumentBody { fields: map }
}

/// Last path segment of a document resource name
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Map a document to a contact; documents missing required fields are rejected
fn map_document(doc: &FirestoreDocument) -> std::result::Result<Contact, String> {
    let id = document_id(&doc.name)
        .ok_or_else(|| format!("document '{}' has no id", doc.name))?;
    let text = |key: &str| {
        doc.fields
            .get(key)
            .and_then(FirestoreValue::as_text)
            .unwrap_or("")
            .to_string()
    };
    let draft = ContactDraft::new(
        text("firstName"),
        text("lastName"),
        text("phoneNumber"),
        text("email"),
    );
    let fields = draft
        .validate()
        .map_err(|e| format!("skipped contact {}: {}", id, e))?;
    Ok(Contact::new(ContactId::new(id), fields))
}

// =============================================================================
// Firestore HTTP client
// =============================================================================

/// Firestore REST client bound to one project and one signed-in user
#[derive(Debug)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    documents_path: String,
    api_key: Option<String>,
    id_token: String,
}

impl FirestoreStore {
    /// Create a store from settings and the session's bearer token
    pub fn new(settings: &FirebaseSettings, id_token: &str) -> Result<Self> {
        let project_id = settings.require_project_id()?;
        let base_url = settings
            .firestore_url
            .clone()
            .unwrap_or_else(|| FIRESTORE_PRODUCTION_URL.to_string());
        Self::new_with_base_url(
            &base_url,
            project_id,
            &settings.database_id,
            settings.api_key.as_deref(),
            id_token,
        )
    }

    /// Create a store against a custom base URL (emulator or mock server)
    pub fn new_with_base_url(
        base_url: &str,
        project_id: &str,
        database_id: &str,
        api_key: Option<&str>,
        id_token: &str,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid Firestore URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Firestore URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if project_id.is_empty() {
            return Err(Error::Config("Firebase project id cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            documents_path: format!("projects/{}/databases/{}/documents", project_id, database_id),
            api_key: api_key.map(str::to_string),
            id_token: id_token.to_string(),
        })
    }

    async fn run_contacts_query(&self) -> Result<LoadedContacts> {
        let op = RemoteOperation::Load;
        let url = self.url(op, &[], Some(":runQuery"))?;
        let query = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": CONTACTS_COLLECTION }],
                "orderBy": [{
                    "field": { "fieldPath": "firstName" },
                    "direction": "ASCENDING"
                }]
            }
        });

        let response = self.send(op, self.request(Method::POST, url).json(&query)).await?;
        let items: Vec<RunQueryItem> = response.json().await.map_err(|e| {
            Error::remote(op, RemoteErrorKind::Rejected, format!("unreadable query response: {}", e))
        })?;

        let mut loaded = LoadedContacts::default();
        for doc in items.iter().filter_map(|item| item.document.as_ref()) {
            match map_document(doc) {
                Ok(contact) => loaded.contacts.push(contact),
                Err(warning) => loaded.warnings.push(warning),
            }
        }
        Ok(loaded)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        if self.id_token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.id_token)
        }
    }

    /// Build a URL under the documents path, percent-encoding ids
    fn url(&self, op: RemoteOperation, segments: &[&str], suffix: Option<&str>) -> Result<Url> {
        let mut raw = format!("{}/{}", self.base_url, self.documents_path);
        if let Some(suffix) = suffix {
            raw.push_str(suffix);
        }
        let mut url = Url::parse(&raw).map_err(|e| {
            Error::remote(op, RemoteErrorKind::Rejected, format!("invalid request URL: {}", e))
        })?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| {
                    Error::remote(op, RemoteErrorKind::Rejected, "base URL cannot hold a path")
                })?
                .extend(segments);
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn send(&self, op: RemoteOperation, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(op, e))?;
        check_response_status(op, response).await
    }
}

/// Map transport errors to classified remote errors
fn map_request_error(op: RemoteOperation, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::remote(
            op,
            RemoteErrorKind::Transient,
            format!("connection timed out after {} seconds", REQUEST_TIMEOUT_SECS),
        )
    } else if error.is_connect() {
        Error::remote(op, RemoteErrorKind::Transient, "unable to connect to Firestore")
    } else {
        Error::remote(op, RemoteErrorKind::Rejected, format!("Firestore request failed: {}", error))
    }
}

/// Turn non-2xx responses into classified remote errors
async fn check_response_status(op: RemoteOperation, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| match envelope.error.status {
            Some(status) if !envelope.error.message.is_empty() => {
                format!("{} ({})", envelope.error.message, status)
            }
            Some(status) => status,
            None => envelope.error.message,
        })
        .unwrap_or_else(|_| format!("Firestore API error: HTTP {}", code));

    let kind = RemoteErrorKind::from_status(code);
    let message = match kind {
        RemoteErrorKind::Unauthorized => format!(
            "access denied, your session may have expired (run 'cb login'): {}",
            detail
        ),
        RemoteErrorKind::NotFound => format!("contact no longer exists: {}", detail),
        _ => detail,
    };
    Err(Error::remote(op, kind, message))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn list_contacts(&self) -> Result<LoadedContacts> {
        self.run_contacts_query().await
    }

    async fn create_contact(&self, fields: &ContactFields) -> Result<ContactId> {
        let op = RemoteOperation::Create;
        let url = self.url(op, &[CONTACTS_COLLECTION], None)?;
        let response = self
            .send(op, self.request(Method::POST, url).json(&to_body(fields)))
            .await?;

        let created: FirestoreDocument = response.json().await.map_err(|e| {
            Error::remote(op, RemoteErrorKind::Rejected, format!("unreadable create response: {}", e))
        })?;
        document_id(&created.name)
            .map(ContactId::new)
            .ok_or_else(|| {
                Error::remote(
                    op,
                    RemoteErrorKind::Rejected,
                    format!("create response has no document id: '{}'", created.name),
                )
            })
    }

    async fn update_contact(&self, id: &ContactId, fields: &ContactFields) -> Result<()> {
        let op = RemoteOperation::Update;
        let mut url = self.url(op, &[CONTACTS_COLLECTION, id.as_str()], None)?;
        // Without an update mask the whole document is replaced
        url.query_pairs_mut().append_pair("currentDocument.exists", "true");
        self.send(op, self.request(Method::PATCH, url).json(&to_body(fields)))
            .await?;
        Ok(())
    }

    async fn delete_contact(&self, id: &ContactId) -> Result<()> {
        let op = RemoteOperation::Delete;
        let url = self.url(op, &[CONTACTS_COLLECTION, id.as_str()], None)?;
        self.send(op, self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

/// Parse a raw JSON document (used by the mock server and tests)
#[cfg(test)]
pub(crate) fn contact_from_json(value: &serde_json::Value) -> Option<Contact> {
    let doc: FirestoreDocument = serde_json::from_value(value.clone()).ok()?;
    map_document(&doc).ok()
}

// =============================================================================
// Tests
// =============================================================================
