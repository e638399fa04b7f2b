//! Contactbook Core - business logic for a personal contact manager
//!
//! This crate follows a hexagonal architecture:
//!
//! - **domain**: Core entities (Contact, ContactDraft, Session, SortConfig)
//! - **ports**: Trait definitions for external dependencies (DocumentStore, SessionProvider)
//! - **services**: Business logic (ContactBook, AuthGate, session provider, event log)
//! - **adapters**: Concrete implementations (Firestore, Firebase Auth, DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adapters::demo::DemoIdentityProvider;
use adapters::duckdb::DuckDbDocumentStore;
use adapters::firebase_auth::FirebaseAuthClient;
use adapters::firestore::FirestoreStore;
use config::Config;
use ports::{DocumentStore, IdentityProvider};
use services::{ContactBook, LocalSessionProvider, ViewLifetime, DEMO_DB_FILE};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, RemoteErrorKind, RemoteOperation, Result};
pub use domain::{
    Contact, ContactDraft, ContactFields, ContactId, Session, SortConfig, SortDirection, SortKey,
    SortKeyChange,
};

/// Main context for contactbook operations
///
/// Holds the configuration and the session provider, and builds the
/// document store for a signed-in session.
pub struct ContactbookContext {
    pub config: Config,
    pub sessions: Arc<LocalSessionProvider>,
    contactbook_dir: PathBuf,
}

impl ContactbookContext {
    /// Load configuration and wire the identity provider for the current mode
    pub fn new(contactbook_dir: &Path) -> Result<Self> {
        let config = Config::load(contactbook_dir)?;

        let identity: Arc<dyn IdentityProvider> = if config.demo_mode {
            Arc::new(DemoIdentityProvider)
        } else {
            Arc::new(FirebaseAuthClient::new(&config.firebase)?)
        };
        let sessions = Arc::new(LocalSessionProvider::new(contactbook_dir, identity));

        Ok(Self {
            config,
            sessions,
            contactbook_dir: contactbook_dir.to_path_buf(),
        })
    }

    pub fn contactbook_dir(&self) -> &Path {
        &self.contactbook_dir
    }

    /// Name of the backend contacts are stored in
    pub fn backend_name(&self) -> &'static str {
        if self.config.demo_mode {
            "duckdb"
        } else {
            "firestore"
        }
    }

    /// How long commands wait for the session state before giving up
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.config.auth_timeout_secs)
    }

    /// Document store acting for `session`
    pub fn open_store(&self, session: &Session) -> Result<Arc<dyn DocumentStore>> {
        if self.config.demo_mode {
            let store = DuckDbDocumentStore::new(&self.contactbook_dir.join(DEMO_DB_FILE))?;
            Ok(Arc::new(store))
        } else {
            Ok(Arc::new(FirestoreStore::new(&self.config.firebase, &session.id_token)?))
        }
    }

    /// Contact book bound to `session`, not yet loaded
    pub fn contact_book(&self, session: &Session, lifetime: ViewLifetime) -> Result<ContactBook> {
        let store = self.open_store(session)?;
        Ok(ContactBook::new(store, lifetime).with_sort_policy(self.config.sort_key_change))
    }
}
