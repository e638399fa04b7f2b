//! Sorting and filtering of the contact list
//!
//! Pure functions over slices; nothing here is cached.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::contact::Contact;

/// Field the list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    FirstName,
    LastName,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::FirstName => "First Name",
            SortKey::LastName => "Last Name",
        }
    }

    fn value<'a>(&self, contact: &'a Contact) -> &'a str {
        match self {
            SortKey::FirstName => &contact.first_name,
            SortKey::LastName => &contact.last_name,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "firstname" | "first" => Ok(SortKey::FirstName),
            "lastname" | "last" => Ok(SortKey::LastName),
            other => Err(format!("unknown sort key '{}': expected first-name or last-name", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("ascending"),
            SortDirection::Descending => f.write_str("descending"),
        }
    }
}

/// What happens to the direction when a different sort key is selected
///
/// Reselecting the active key always flips the direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKeyChange {
    /// Keep the current direction
    #[default]
    Keep,
    /// Flip the direction on every selection, whatever the key
    Flip,
    /// Start the new key ascending
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::FirstName,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Result of the user selecting `key` in the sort controls
    pub fn select(self, key: SortKey, policy: SortKeyChange) -> Self {
        let direction = if key == self.key {
            self.direction.flipped()
        } else {
            match policy {
                SortKeyChange::Keep => self.direction,
                SortKeyChange::Flip => self.direction.flipped(),
                SortKeyChange::Reset => SortDirection::Ascending,
            }
        };
        Self { key, direction }
    }

    fn compare(&self, a: &Contact, b: &Contact) -> Ordering {
        let ordering = self.key.value(a).cmp(self.key.value(b));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Whether `contact` matches the search text
///
/// Names match case-insensitively, phone numbers by plain substring.
pub fn matches_query(contact: &Contact, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let lowered = query.to_lowercase();
    contact.first_name.to_lowercase().contains(&lowered)
        || contact.last_name.to_lowercase().contains(&lowered)
        || contact.phone_number.contains(query)
}

/// Contacts matching `query`, in their original order
pub fn filter_contacts<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    contacts.iter().filter(|c| matches_query(c, query)).collect()
}

/// Stable sort by the configured key and direction
pub fn sort_contacts(contacts: &mut [&Contact], config: SortConfig) {
    contacts.sort_by(|a, b| config.compare(a, b));
}
