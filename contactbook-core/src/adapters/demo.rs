//! Demo data and identity for running without a hosted project
//!
//! Demo mode signs in any email without a password check and fills the
//! local store with a fixed set of contacts.

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::{Contact, ContactFields, ContactId, Session};
use crate::ports::IdentityProvider;

/// User id of every demo session
pub const DEMO_UID: &str = "demo-user";

/// Fixed demo contacts; ids are stable so reseeding is idempotent
pub fn generate_demo_contacts() -> Vec<Contact> {
    let people = [
        ("Ada", "Lovelace", "555-0100", "ada@example.com"),
        ("Grace", "Hopper", "555-0101", "grace@example.com"),
        ("Alan", "Turing", "555-0102", ""),
        ("Katherine", "Johnson", "555-0103", "katherine@example.com"),
        ("Linus", "Torvalds", "555-0104", ""),
        ("Margaret", "Hamilton", "555-0105", "margaret@example.com"),
        ("Dennis", "Ritchie", "555-0106", ""),
        ("Barbara", "Liskov", "555-0107", "barbara@example.com"),
    ];

    people
        .iter()
        .enumerate()
        .map(|(i, (first, last, phone, email))| {
            Contact::new(
                ContactId::new(format!("demo-{:03}", i + 1)),
                ContactFields {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone_number: phone.to_string(),
                    email: email.to_string(),
                },
            )
        })
        .collect()
}

/// Identity provider that accepts any non-empty email
pub struct DemoIdentityProvider;

#[async_trait]
impl IdentityProvider for DemoIdentityProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Auth("email is required".to_string()));
        }
        Ok(Session::local(DEMO_UID, email))
    }

    async fn refresh(&self, session: &Session) -> Result<Session> {
        Ok(session.clone())
    }
}
