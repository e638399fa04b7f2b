//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod confirm;
mod document_store;
mod identity;
mod session;

pub use confirm::{AlwaysConfirm, Confirmer};
pub use document_store::{DocumentStore, LoadedContacts, CONTACTS_COLLECTION};
pub use identity::IdentityProvider;
pub use session::{SessionListener, SessionProvider, Subscription};
