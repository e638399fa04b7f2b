//! Document store port - remote contact persistence

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Contact, ContactFields, ContactId};

/// Name of the collection holding contact documents
pub const CONTACTS_COLLECTION: &str = "contacts";

/// Contacts read from the store plus documents that could not be used
#[derive(Debug, Default)]
pub struct LoadedContacts {
    pub contacts: Vec<Contact>,
    /// One message per stored document that was skipped
    pub warnings: Vec<String>,
}

impl LoadedContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            warnings: Vec::new(),
        }
    }
}

/// Contact persistence abstraction
///
/// Implementations talk to the hosted document database (or a local stand-in).
/// Failures are reported as `Error::Remote` with the operation and a
/// transient/permanent classification.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name (e.g., "firestore", "duckdb")
    fn name(&self) -> &str;

    /// All contacts, ordered by first name ascending
    ///
    /// Stored documents missing a required field are left out and reported
    /// in `warnings` rather than failing the whole load.
    async fn list_contacts(&self) -> Result<LoadedContacts>;

    /// Store a new contact and return the id the store assigned
    async fn create_contact(&self, fields: &ContactFields) -> Result<ContactId>;

    /// Overwrite every field of an existing contact
    async fn update_contact(&self, id: &ContactId, fields: &ContactFields) -> Result<()>;

    /// Remove a contact
    async fn delete_contact(&self, id: &ContactId) -> Result<()>;
}
