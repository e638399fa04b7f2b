//! In-memory document store
//!
//! Used by tests and as a scratch store. Failures and latency can be
//! injected per operation to exercise the manager's error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::result::{Error, RemoteErrorKind, RemoteOperation, Result};
use crate::domain::{Contact, ContactFields, ContactId};
use crate::ports::{DocumentStore, LoadedContacts};

#[derive(Default)]
struct MemoryState {
    contacts: Vec<Contact>,
    failures: HashMap<RemoteOperation, RemoteErrorKind>,
    delay: Option<Duration>,
}

/// Contact collection held in memory
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<MemoryState>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with contacts
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.contacts = contacts;
        }
        store
    }

    /// Make every call of `operation` fail with `kind` until cleared
    pub fn fail_on(&self, operation: RemoteOperation, kind: RemoteErrorKind) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(operation, kind);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.clear();
        }
    }

    /// Sleep this long before answering each call
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut state) = self.state.lock() {
            state.delay = delay;
        }
    }

    /// Number of store calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of the stored contacts in insertion order
    pub fn snapshot(&self) -> Vec<Contact> {
        self.state
            .lock()
            .map(|state| state.contacts.clone())
            .unwrap_or_default()
    }

    /// Count the call, wait out the configured delay, then report any injected failure
    async fn begin(&self, op: RemoteOperation) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, failure) = {
            let state = self.lock()?;
            (state.delay, state.failures.get(&op).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(kind) => Err(Error::remote(op, kind, "injected failure")),
            None => Ok(()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_contacts(&self) -> Result<LoadedContacts> {
        self.begin(RemoteOperation::Load).await?;
        let mut contacts = self.lock()?.contacts.clone();
        contacts.sort_by(|a, b| a.first_name.cmp(&b.first_name));
        Ok(LoadedContacts::new(contacts))
    }

    async fn create_contact(&self, fields: &ContactFields) -> Result<ContactId> {
        self.begin(RemoteOperation::Create).await?;
        let id = ContactId::new(format!(
            "mem-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        ));
        self.lock()?
            .contacts
            .push(Contact::new(id.clone(), fields.clone()));
        Ok(id)
    }

    async fn update_contact(&self, id: &ContactId, fields: &ContactFields) -> Result<()> {
        let op = RemoteOperation::Update;
        self.begin(op).await?;
        let mut state = self.lock()?;
        match state.contacts.iter_mut().find(|c| &c.id == id) {
            Some(contact) => {
                *contact = Contact::new(id.clone(), fields.clone());
                Ok(())
            }
            None => Err(Error::remote(
                op,
                RemoteErrorKind::NotFound,
                format!("contact no longer exists: {}", id),
            )),
        }
    }

    async fn delete_contact(&self, id: &ContactId) -> Result<()> {
        self.begin(RemoteOperation::Delete).await?;
        self.lock()?.contacts.retain(|c| &c.id != id);
        Ok(())
    }
}
