//! Mock Firebase server for testing
//!
//! A small in-process HTTP server that answers the Firestore and Firebase
//! Auth REST calls the adapters make, so they can be tested without a real
//! project:
//! - POST .../documents:runQuery returns `[{ document, readTime }]` ordered by firstName
//! - POST .../documents/contacts creates a document with a generated id
//! - PATCH .../documents/contacts/{id}?currentDocument.exists=true replaces a document
//! - DELETE .../documents/contacts/{id} removes a document
//! - POST .../accounts:signInWithPassword and POST .../token issue tokens

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

/// Mock Firebase server for testing
pub struct MockFirestoreServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for mock behaviour
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reject every request with 403 PERMISSION_DENIED
    pub fail_auth: bool,
    /// Answer every request with this HTTP status
    pub fail_status: Option<u16>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
    /// Accepted email/password pairs for sign-in
    pub users: Vec<(String, String)>,
    /// Lifetime of issued id tokens
    pub expires_in_secs: i64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_auth: false,
            fail_status: None,
            delay_ms: 0,
            users: vec![("ada@example.com".to_string(), "correct-horse".to_string())],
            expires_in_secs: 3600,
        }
    }
}

#[derive(Default)]
struct MockState {
    documents: Mutex<BTreeMap<String, Value>>,
    next_id: AtomicUsize,
    requests: AtomicUsize,
}

const DOCUMENT_PREFIX: &str = "projects/demo-project/databases/(default)/documents/contacts";

impl MockFirestoreServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState::default());

        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Insert a document with arbitrary fields
    pub fn insert_raw(&self, id: &str, fields: Value) {
        if let Ok(mut docs) = self.state.documents.lock() {
            docs.insert(id.to_string(), fields);
        }
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockFirestoreServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Build an unsigned JWT whose payload carries the given claims
pub fn fake_id_token(uid: &str, email: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "user_id": uid, "sub": uid, "email": email, "exp": exp }).to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

struct Request {
    method: String,
    path: String,
    query: String,
    headers: String,
    body: String,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let first_line = head.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    Some(Request {
        method,
        path: path.to_string(),
        query: query.to_string(),
        headers: head.to_lowercase(),
        body: String::from_utf8_lossy(&data[header_end..]).to_string(),
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &MockState) {
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    state.requests.fetch_add(1, Ordering::SeqCst);

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if let Some(status) = config.fail_status {
        let body = error_body(status, "mock failure", status_name(status));
        send_response(&mut stream, status, &body);
        return;
    }

    if request.path.ends_with("accounts:signInWithPassword") {
        handle_sign_in(&mut stream, config, &request);
        return;
    }
    if request.path.ends_with("/token") {
        handle_refresh(&mut stream, config, &request);
        return;
    }

    if config.fail_auth || !request.headers.contains("authorization: bearer ") {
        let body = error_body(403, "Missing or insufficient permissions.", "PERMISSION_DENIED");
        send_response(&mut stream, 403, &body);
        return;
    }

    let Some(rest) = request.path.split("/documents").nth(1) else {
        send_response(&mut stream, 404, &error_body(404, "Endpoint not found", "NOT_FOUND"));
        return;
    };
    let rest = rest.to_string();

    match (request.method.as_str(), rest.as_str()) {
        ("POST", ":runQuery") => {
            let docs = state.documents.lock().map(|d| d.clone()).unwrap_or_default();
            let mut entries: Vec<(&String, &Value)> = docs.iter().collect();
            entries.sort_by(|a, b| {
                let key = |v: &Value| v["firstName"]["stringValue"].as_str().unwrap_or("").to_string();
                key(a.1).cmp(&key(b.1))
            });
            let mut items: Vec<Value> = entries
                .into_iter()
                .map(|(id, fields)| json!({ "document": document(id, fields), "readTime": "2026-01-01T00:00:00Z" }))
                .collect();
            if items.is_empty() {
                items.push(json!({ "readTime": "2026-01-01T00:00:00Z" }));
            }
            send_response(&mut stream, 200, &Value::Array(items).to_string());
        }
        ("POST", "/contacts") => {
            let fields = parse_fields(&request.body);
            let id = format!("mock{:016}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            if let Ok(mut docs) = state.documents.lock() {
                docs.insert(id.clone(), fields.clone());
            }
            send_response(&mut stream, 200, &document(&id, &fields).to_string());
        }
        (method @ ("PATCH" | "DELETE"), path) if path.starts_with("/contacts/") => {
            let id = path.trim_start_matches("/contacts/").to_string();
            let Ok(mut docs) = state.documents.lock() else {
                send_response(&mut stream, 500, &error_body(500, "poisoned", "INTERNAL"));
                return;
            };
            if method == "DELETE" {
                docs.remove(&id);
                send_response(&mut stream, 200, "{}");
            } else if request.query.contains("currentDocument.exists=true") && !docs.contains_key(&id) {
                let body = error_body(404, &format!("No document to update: {}/{}", DOCUMENT_PREFIX, id), "NOT_FOUND");
                send_response(&mut stream, 404, &body);
            } else {
                let fields = parse_fields(&request.body);
                docs.insert(id.clone(), fields.clone());
                send_response(&mut stream, 200, &document(&id, &fields).to_string());
            }
        }
        _ => {
            send_response(&mut stream, 404, &error_body(404, "Endpoint not found", "NOT_FOUND"));
        }
    }
}

fn handle_sign_in(stream: &mut TcpStream, config: &MockConfig, request: &Request) {
    let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
    let email = body["email"].as_str().unwrap_or("");
    let password = body["password"].as_str().unwrap_or("");

    let known = config
        .users
        .iter()
        .any(|(e, p)| e.eq_ignore_ascii_case(email) && p == password);
    if !known {
        send_response(stream, 400, &error_body(400, "INVALID_LOGIN_CREDENTIALS", "INVALID_ARGUMENT"));
        return;
    }

    let uid = format!("uid-{}", email.split('@').next().unwrap_or("user"));
    let exp = chrono::Utc::now().timestamp() + config.expires_in_secs;
    let response = json!({
        "localId": uid,
        "email": email,
        "idToken": fake_id_token(&uid, email, exp),
        "refreshToken": format!("refresh-{}", uid),
        "expiresIn": config.expires_in_secs.to_string(),
        "registered": true
    });
    send_response(stream, 200, &response.to_string());
}

fn handle_refresh(stream: &mut TcpStream, config: &MockConfig, request: &Request) {
    let refresh_token = request
        .body
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "refresh_token")
        .map(|(_, v)| v.to_string())
        .unwrap_or_default();

    let Some(uid) = refresh_token.strip_prefix("refresh-") else {
        send_response(stream, 400, &error_body(400, "INVALID_REFRESH_TOKEN", "INVALID_ARGUMENT"));
        return;
    };

    let exp = chrono::Utc::now().timestamp() + config.expires_in_secs;
    let response = json!({
        "id_token": fake_id_token(uid, "", exp),
        "refresh_token": refresh_token,
        "expires_in": config.expires_in_secs.to_string(),
        "token_type": "Bearer",
        "user_id": uid
    });
    send_response(stream, 200, &response.to_string());
}

fn parse_fields(body: &str) -> Value {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("fields").cloned())
        .unwrap_or_else(|| json!({}))
}

fn document(id: &str, fields: &Value) -> Value {
    json!({
        "name": format!("{}/{}", DOCUMENT_PREFIX, id),
        "fields": fields,
        "createTime": "2026-01-01T00:00:00Z",
        "updateTime": "2026-01-01T00:00:00Z"
    })
}

fn error_body(code: u16, message: &str, status: &str) -> String {
    json!({ "error": { "code": code, "message": message, "status": status } }).to_string()
}

fn status_name(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        429 => "RESOURCE_EXHAUSTED",
        503 => "UNAVAILABLE",
        _ => "INTERNAL",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_name(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenClaims;

    #[test]
    fn test_mock_server_starts() {
        let server = MockFirestoreServer::start(MockConfig::default()).unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_fake_token_decodes() {
        let token = fake_id_token("uid-ada", "ada@example.com", 1_900_000_000);
        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.uid(), Some("uid-ada"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
    }
}
