//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod contact;
mod session;
pub mod result;
pub mod view;

pub use contact::{Contact, ContactDraft, ContactFields, ContactId, RequiredField, ValidationError};
pub use session::{Session, TokenClaims};
pub use view::{SortConfig, SortDirection, SortKey, SortKeyChange};
