//! Contact book service - the in-memory contact collection
//!
//! Holds the working set of contacts loaded from a document store, the
//! form draft, the search query and the sort order. Every mutation is sent
//! to the store first and applied locally only after the store accepts it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::result::{Error, RemoteOperation, Result};
use crate::domain::view::{filter_contacts, sort_contacts};
use crate::domain::{Contact, ContactDraft, ContactId, SortConfig, SortKey, SortKeyChange};
use crate::ports::{Confirmer, DocumentStore};

/// Liveness token for one contact view
///
/// Clones share the same flag. Once closed, results of in-flight store
/// calls are discarded instead of being applied.
#[derive(Debug, Clone)]
pub struct ViewLifetime {
    open: Arc<AtomicBool>,
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn ensure_open(&self, operation: RemoteOperation) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::StaleMutation { operation })
        }
    }
}

impl Default for ViewLifetime {
    fn default() -> Self {
        Self::new()
    }
}

/// What a successful submit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(ContactId),
    Updated(ContactId),
}

impl SubmitOutcome {
    pub fn id(&self) -> &ContactId {
        match self {
            SubmitOutcome::Created(id) | SubmitOutcome::Updated(id) => id,
        }
    }
}

/// What a delete request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(ContactId),
    /// The user declined the confirmation; nothing was sent
    Declined,
}

/// Result of a load
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub count: usize,
    /// Stored documents that were skipped as unusable
    pub warnings: Vec<String>,
}

/// Contact collection manager for one view
pub struct ContactBook {
    store: Arc<dyn DocumentStore>,
    contacts: Vec<Contact>,
    sort: SortConfig,
    sort_policy: SortKeyChange,
    query: String,
    draft: ContactDraft,
    editing: Option<ContactId>,
    lifetime: ViewLifetime,
}

impl fmt::Debug for ContactBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactBook")
            .field("store", &self.store.name())
            .field("contacts", &self.contacts.len())
            .field("sort", &self.sort)
            .field("editing", &self.editing)
            .field("open", &self.lifetime.is_open())
            .finish()
    }
}

impl ContactBook {
    /// Create an empty book; call `load` to fetch the collection
    pub fn new(store: Arc<dyn DocumentStore>, lifetime: ViewLifetime) -> Self {
        Self {
            store,
            contacts: Vec::new(),
            sort: SortConfig::default(),
            sort_policy: SortKeyChange::default(),
            query: String::new(),
            draft: ContactDraft::default(),
            editing: None,
            lifetime,
        }
    }

    /// Set how selecting a different sort key treats the direction
    pub fn with_sort_policy(mut self, policy: SortKeyChange) -> Self {
        self.sort_policy = policy;
        self
    }

    pub fn lifetime(&self) -> &ViewLifetime {
        &self.lifetime
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Contacts in load order, with mutations applied in place
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| &c.id == id)
    }

    // === Remote operations ===

    /// Replace the working set with the store's contacts
    pub async fn load(&mut self) -> Result<LoadSummary> {
        let op = RemoteOperation::Load;
        self.lifetime.ensure_open(op)?;

        let result = self.store.list_contacts().await;
        self.lifetime.ensure_open(op)?;

        let loaded = result?;
        self.contacts = loaded.contacts;
        Ok(LoadSummary {
            count: self.contacts.len(),
            warnings: loaded.warnings,
        })
    }

    /// Validate the draft and create or update a contact from it
    ///
    /// Validation failures make no store call. Remote failures leave the
    /// collection and the draft untouched so the user can retry.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let fields = self.draft.validate()?;

        let outcome = match self.editing.clone() {
            Some(id) => {
                let op = RemoteOperation::Update;
                self.lifetime.ensure_open(op)?;
                let result = self.store.update_contact(&id, &fields).await;
                self.lifetime.ensure_open(op)?;
                result?;

                let updated = Contact::new(id.clone(), fields);
                match self.contacts.iter_mut().find(|c| c.id == id) {
                    Some(slot) => *slot = updated,
                    None => self.contacts.push(updated),
                }
                SubmitOutcome::Updated(id)
            }
            None => {
                let op = RemoteOperation::Create;
                self.lifetime.ensure_open(op)?;
                let result = self.store.create_contact(&fields).await;
                self.lifetime.ensure_open(op)?;
                let id = result?;

                self.contacts.push(Contact::new(id.clone(), fields));
                SubmitOutcome::Created(id)
            }
        };

        self.draft.clear();
        self.editing = None;
        Ok(outcome)
    }

    /// Delete a contact after the confirmer agrees
    pub async fn delete<C>(&mut self, id: &ContactId, confirmer: &C) -> Result<DeleteOutcome>
    where
        C: Confirmer + ?Sized,
    {
        let op = RemoteOperation::Delete;
        let contact = self
            .get(id)
            .ok_or_else(|| Error::not_found(format!("contact {}", id)))?;
        let prompt = format!("Delete {}?", contact.full_name());

        if !confirmer.confirm(&prompt)? {
            return Ok(DeleteOutcome::Declined);
        }

        self.lifetime.ensure_open(op)?;
        let result = self.store.delete_contact(id).await;
        self.lifetime.ensure_open(op)?;
        result?;

        self.contacts.retain(|c| &c.id != id);
        if self.editing.as_ref() == Some(id) {
            self.cancel_edit();
        }
        Ok(DeleteOutcome::Deleted(id.clone()))
    }

    // === Draft and edit mode ===

    /// Load a contact into the draft and switch to edit mode
    pub fn begin_edit(&mut self, id: &ContactId) -> Result<()> {
        let contact = self
            .get(id)
            .ok_or_else(|| Error::not_found(format!("contact {}", id)))?;
        self.draft = ContactDraft::from_contact(contact);
        self.editing = Some(id.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.draft.clear();
        self.editing = None;
    }

    pub fn draft(&self) -> &ContactDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ContactDraft {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: ContactDraft) {
        self.draft = draft;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<&ContactId> {
        self.editing.as_ref()
    }

    /// Label for the form's submit action
    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Update Contact"
        } else {
            "Add Contact"
        }
    }

    // === Derived views ===

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn search_query(&self) -> &str {
        &self.query
    }

    /// Select a sort key; reselecting the active key flips the direction
    pub fn select_sort_key(&mut self, key: SortKey) {
        self.sort = self.sort.select(key, self.sort_policy);
    }

    pub fn set_sort_config(&mut self, config: SortConfig) {
        self.sort = config;
    }

    pub fn sort_config(&self) -> SortConfig {
        self.sort
    }

    /// Contacts matching the search query
    pub fn filtered(&self) -> Vec<&Contact> {
        filter_contacts(&self.contacts, &self.query)
    }

    /// Contacts matching the search query, in sort order
    pub fn visible(&self) -> Vec<&Contact> {
        let mut rows = self.filtered();
        sort_contacts(&mut rows, self.sort);
        rows
    }
}
