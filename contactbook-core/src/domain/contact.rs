//! Contact domain model

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned contact identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Validated contact fields, as stored in the `contacts` collection
///
/// Only produced by `ContactDraft::validate`, so the three required fields
/// are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
}

/// A persisted contact
///
/// Always carries the id the document store assigned on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
}

impl Contact {
    pub fn new(id: ContactId, fields: ContactFields) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            phone_number: fields.phone_number,
            email: fields.email,
        }
    }

    /// Copy of the stored fields without the id
    pub fn fields(&self) -> ContactFields {
        ContactFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Email for display; `N/A` when none was given
    pub fn email_display(&self) -> &str {
        if self.email.trim().is_empty() {
            "N/A"
        } else {
            &self.email
        }
    }
}

/// Required form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    FirstName,
    LastName,
    PhoneNumber,
}

impl RequiredField {
    pub fn label(&self) -> &'static str {
        match self {
            RequiredField::FirstName => "First Name",
            RequiredField::LastName => "Last Name",
            RequiredField::PhoneNumber => "Phone Number",
        }
    }
}

/// A draft was submitted with required fields left empty
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("First Name, Last Name, and Phone Number are required (missing: {})", missing_labels(.missing))]
pub struct ValidationError {
    pub missing: Vec<RequiredField>,
}

fn missing_labels(missing: &[RequiredField]) -> String {
    missing
        .iter()
        .map(RequiredField::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// In-progress form values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
}

impl ContactDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
        }
    }

    /// Draft pre-filled from an existing contact
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            phone_number: contact.phone_number.clone(),
            email: contact.email.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.phone_number.is_empty()
            && self.email.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check required fields and produce storable values
    ///
    /// Whitespace-only values count as empty. Values are trimmed.
    pub fn validate(&self) -> std::result::Result<ContactFields, ValidationError> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() {
            missing.push(RequiredField::FirstName);
        }
        if self.last_name.trim().is_empty() {
            missing.push(RequiredField::LastName);
        }
        if self.phone_number.trim().is_empty() {
            missing.push(RequiredField::PhoneNumber);
        }
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        Ok(ContactFields {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}
