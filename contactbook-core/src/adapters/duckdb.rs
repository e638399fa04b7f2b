//! DuckDB document store for demo mode
//!
//! Keeps the contact collection in a local `demo.duckdb` file so the whole
//! app can be exercised without a hosted project.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::{Error, RemoteErrorKind, RemoteOperation, Result};
use crate::domain::{Contact, ContactFields, ContactId};
use crate::migrations::MIGRATIONS;
use crate::ports::{DocumentStore, LoadedContacts};
use crate::services::MigrationService;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Wrap a database failure as a remote failure of the given operation
fn store_error(op: RemoteOperation, err: impl std::fmt::Display) -> Error {
    let message = err.to_string();
    let kind = if is_retryable_error(&message) {
        RemoteErrorKind::Transient
    } else {
        RemoteErrorKind::Rejected
    };
    Error::remote(op, kind, message)
}

/// Contact collection stored in DuckDB
pub struct DuckDbDocumentStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbDocumentStore {
    /// Open (or create) the store, retrying while another process holds the file
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        let conn = loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => break conn,
                Err(e) if attempt + 1 < MAX_RETRIES && is_retryable_error(&e.to_string()) => {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    eprintln!(
                        "[contactbook] Database busy, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        MAX_RETRIES,
                        e
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let store = Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: PathBuf::from(":memory:"),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Run pending schema migrations
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS).run_pending()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Number of stored contacts
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Insert contacts with fixed ids (seeding)
    pub fn insert_contacts(&self, contacts: &[Contact]) -> Result<()> {
        let conn = self.lock()?;
        for contact in contacts {
            conn.execute(
                "INSERT OR REPLACE INTO contacts (contact_id, first_name, last_name, phone_number, email)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    contact.id.as_str(),
                    &contact.first_name,
                    &contact.last_name,
                    &contact.phone_number,
                    &contact.email,
                ],
            )?;
        }
        Ok(())
    }

    /// Remove every contact
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM contacts", [])?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for DuckDbDocumentStore {
    fn name(&self) -> &str {
        "duckdb"
    }

    async fn list_contacts(&self) -> Result<LoadedContacts> {
        let op = RemoteOperation::Load;
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT contact_id, first_name, last_name, phone_number, email
                 FROM contacts
                 ORDER BY first_name ASC",
            )
            .map_err(|e| store_error(op, e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Contact {
                    id: ContactId::new(row.get::<_, String>(0)?),
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    phone_number: row.get(3)?,
                    email: row.get(4)?,
                })
            })
            .map_err(|e| store_error(op, e))?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row.map_err(|e| store_error(op, e))?);
        }
        Ok(LoadedContacts::new(contacts))
    }

    async fn create_contact(&self, fields: &ContactFields) -> Result<ContactId> {
        let op = RemoteOperation::Create;
        let id = ContactId::new(Uuid::new_v4().simple().to_string());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contacts (contact_id, first_name, last_name, phone_number, email)
             VALUES (?, ?, ?, ?, ?)",
            params![
                id.as_str(),
                &fields.first_name,
                &fields.last_name,
                &fields.phone_number,
                &fields.email,
            ],
        )
        .map_err(|e| store_error(op, e))?;
        Ok(id)
    }

    async fn update_contact(&self, id: &ContactId, fields: &ContactFields) -> Result<()> {
        let op = RemoteOperation::Update;
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE contacts
                 SET first_name = ?, last_name = ?, phone_number = ?, email = ?,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE contact_id = ?",
                params![
                    &fields.first_name,
                    &fields.last_name,
                    &fields.phone_number,
                    &fields.email,
                    id.as_str(),
                ],
            )
            .map_err(|e| store_error(op, e))?;
        if changed == 0 {
            return Err(Error::remote(
                op,
                RemoteErrorKind::NotFound,
                format!("contact no longer exists: {}", id),
            ));
        }
        Ok(())
    }

    async fn delete_contact(&self, id: &ContactId) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM contacts WHERE contact_id = ?", [id.as_str()])
            .map_err(|e| store_error(RemoteOperation::Delete, e))?;
        Ok(())
    }
}
