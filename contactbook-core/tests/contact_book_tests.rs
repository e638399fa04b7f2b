//! Integration tests for the contact book
//!
//! The manager runs against the in-memory store (for failure injection and
//! call counting) and against a real DuckDB file store.
//!
//! Run with: cargo test --test contact_book_tests -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use contactbook_core::adapters::duckdb::DuckDbDocumentStore;
use contactbook_core::adapters::memory::MemoryDocumentStore;
use contactbook_core::domain::view::{filter_contacts, matches_query, sort_contacts};
use contactbook_core::ports::{AlwaysConfirm, DocumentStore};
use contactbook_core::services::{ContactBook, DeleteOutcome, SubmitOutcome, ViewLifetime};
use contactbook_core::{
    Contact, ContactDraft, ContactFields, ContactId, Error, RemoteErrorKind, RemoteOperation,
    SortConfig, SortDirection, SortKey, SortKeyChange,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn contact(id: &str, first: &str, last: &str, phone: &str) -> Contact {
    Contact::new(
        ContactId::new(id),
        ContactFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone_number: phone.to_string(),
            email: String::new(),
        },
    )
}

fn sample_contacts() -> Vec<Contact> {
    vec![
        contact("c1", "Ann", "Lee", "555-0001"),
        contact("c2", "Bob", "Ray", "555-0002"),
        contact("c3", "ann", "Brown", "555-1000"),
        contact("c4", "Cleo", "Lee", "020 7946"),
        contact("c5", "Dev", "Ng", "555-0001"),
        contact("c6", "Ann", "Ames", "123"),
    ]
}

async fn book_with(contacts: Vec<Contact>) -> (ContactBook, Arc<MemoryDocumentStore>) {
    let store = Arc::new(MemoryDocumentStore::with_contacts(contacts));
    let mut book = ContactBook::new(store.clone(), ViewLifetime::new());
    book.load().await.expect("load should succeed");
    (book, store)
}

fn decline(_prompt: &str) -> bool {
    false
}

// ============================================================================
// Submit: validation
// ============================================================================

/// Every combination of missing required fields is rejected without a store call
#[tokio::test]
async fn test_invalid_drafts_make_no_remote_call() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let before = book.contacts().to_vec();
    let calls = store.call_count();

    for mask in 0u8..7 {
        for blank in ["", "   "] {
            let pick = |bit: u8, value: &str| {
                if mask & bit != 0 {
                    value.to_string()
                } else {
                    blank.to_string()
                }
            };
            let draft = ContactDraft::new(pick(1, "Eve"), pick(2, "Stone"), pick(4, "555"), "e@x.io");
            book.set_draft(draft.clone());

            let err = book.submit().await.unwrap_err();
            let Error::Validation(validation) = err else {
                panic!("expected a validation error, got {:?}", err);
            };
            assert_eq!(validation.missing.len(), 3 - mask.count_ones() as usize);
            assert_eq!(book.draft(), &draft, "draft must be kept");
        }
    }

    assert_eq!(store.call_count(), calls);
    assert_eq!(book.contacts(), before.as_slice());
}

// ============================================================================
// Submit: create and update
// ============================================================================

#[tokio::test]
async fn test_create_appends_record_with_store_id() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let before = book.len();

    book.set_draft(ContactDraft::new("Eve", "Stone", "555-9999", ""));
    let outcome = book.submit().await.unwrap();
    let SubmitOutcome::Created(id) = outcome else {
        panic!("expected a create");
    };

    assert_eq!(book.len(), before + 1);
    assert_eq!(book.contacts().iter().filter(|c| c.id == id).count(), 1);
    assert!(store.snapshot().iter().any(|c| c.id == id));
    assert!(book.draft().is_empty());
    assert!(!book.is_editing());

    // The new id is live for edit and delete
    book.begin_edit(&id).unwrap();
    book.cancel_edit();
    let deleted = book.delete(&id, &AlwaysConfirm).await.unwrap();
    assert_eq!(deleted, DeleteOutcome::Deleted(id));
    assert_eq!(book.len(), before);
}

#[tokio::test]
async fn test_update_replaces_all_four_fields() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let before = book.len();
    let id = ContactId::new("c2");

    book.begin_edit(&id).unwrap();
    assert!(book.is_editing());
    assert_eq!(book.editing_id(), Some(&id));
    book.set_draft(ContactDraft::new("Robert", "Rayner", "555-7777", "rob@example.com"));

    let outcome = book.submit().await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Updated(id.clone()));
    assert_eq!(book.len(), before);

    let updated = book.get(&id).unwrap();
    assert_eq!(updated.first_name, "Robert");
    assert_eq!(updated.last_name, "Rayner");
    assert_eq!(updated.phone_number, "555-7777");
    assert_eq!(updated.email, "rob@example.com");
    assert_eq!(store.snapshot().iter().find(|c| c.id == id), Some(updated));
    assert!(!book.is_editing());
}

#[tokio::test]
async fn test_failed_create_leaves_state_for_retry() {
    let (mut book, store) = book_with(vec![]).await;
    store.fail_on(RemoteOperation::Create, RemoteErrorKind::Transient);
    book.set_draft(ContactDraft::new("Eve", "Stone", "555", ""));

    let err = book.submit().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Remote {
            operation: RemoteOperation::Create,
            kind: RemoteErrorKind::Transient,
            ..
        }
    ));
    assert!(book.is_empty());
    assert_eq!(book.draft().first_name, "Eve");

    store.clear_failures();
    book.submit().await.unwrap();
    assert_eq!(book.len(), 1);
}

#[tokio::test]
async fn test_update_of_vanished_contact_reports_not_found() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let id = ContactId::new("c1");
    book.begin_edit(&id).unwrap();

    // Someone else removed it remotely
    store.delete_contact(&id).await.unwrap();

    let err = book.submit().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Remote {
            kind: RemoteErrorKind::NotFound,
            ..
        }
    ));
    assert!(book.get(&id).is_some(), "local state untouched on failure");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_confirmed_delete_removes_record() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let before = book.len();
    let id = ContactId::new("c4");

    let outcome = book.delete(&id, &AlwaysConfirm).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(id.clone()));
    assert_eq!(book.len(), before - 1);
    assert!(book.get(&id).is_none());
    assert!(store.snapshot().iter().all(|c| c.id != id));
}

#[tokio::test]
async fn test_declined_delete_touches_nothing() {
    let (mut book, store) = book_with(sample_contacts()).await;
    let before = book.contacts().to_vec();
    let calls = store.call_count();

    let outcome = book.delete(&ContactId::new("c1"), &decline).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(book.contacts(), before.as_slice());
    assert_eq!(store.call_count(), calls);
    assert_eq!(store.snapshot().len(), before.len());
}

#[tokio::test]
async fn test_confirmer_sees_contact_name() {
    let (mut book, _) = book_with(sample_contacts()).await;
    let seen = std::sync::Mutex::new(String::new());
    let confirmer = |prompt: &str| {
        *seen.lock().unwrap() = prompt.to_string();
        false
    };

    book.delete(&ContactId::new("c2"), &confirmer).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), "Delete Bob Ray?");
}

#[tokio::test]
async fn test_failed_delete_keeps_record() {
    let (mut book, store) = book_with(sample_contacts()).await;
    store.fail_on(RemoteOperation::Delete, RemoteErrorKind::Unauthorized);

    let err = book.delete(&ContactId::new("c1"), &AlwaysConfirm).await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(book.get(&ContactId::new("c1")).is_some());
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found_before_prompt() {
    let (mut book, _) = book_with(sample_contacts()).await;
    let asked = std::sync::atomic::AtomicBool::new(false);
    let confirmer = |_: &str| {
        asked.store(true, std::sync::atomic::Ordering::SeqCst);
        true
    };

    let err = book.delete(&ContactId::new("nope"), &confirmer).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!asked.load(std::sync::atomic::Ordering::SeqCst));
}

// ============================================================================
// Load
// ============================================================================

#[tokio::test]
async fn test_load_failure_is_reported() {
    let store = Arc::new(MemoryDocumentStore::with_contacts(sample_contacts()));
    store.fail_on(RemoteOperation::Load, RemoteErrorKind::Transient);
    let mut book = ContactBook::new(store, ViewLifetime::new());

    let err = book.load().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(book.is_empty());
}

#[tokio::test]
async fn test_load_orders_by_first_name() {
    let (book, _) = book_with(sample_contacts()).await;
    let firsts: Vec<_> = book.contacts().iter().map(|c| c.first_name.as_str()).collect();
    let mut sorted = firsts.clone();
    sorted.sort();
    assert_eq!(firsts, sorted);
}

// ============================================================================
// Liveness
// ============================================================================

#[tokio::test]
async fn test_result_after_view_closed_is_discarded() {
    let (mut book, store) = book_with(vec![]).await;
    store.set_delay(Some(Duration::from_millis(100)));
    book.set_draft(ContactDraft::new("Eve", "Stone", "555", ""));

    let lifetime = book.lifetime().clone();
    let (result, _) = tokio::join!(book.submit(), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        lifetime.close();
    });

    assert!(matches!(
        result,
        Err(Error::StaleMutation {
            operation: RemoteOperation::Create
        })
    ));
    assert!(book.is_empty(), "closed view must not be mutated");
    assert_eq!(book.draft().first_name, "Eve");
}

#[tokio::test]
async fn test_delete_after_view_closed_is_discarded() {
    let (mut book, store) = book_with(sample_contacts()).await;
    store.set_delay(Some(Duration::from_millis(100)));
    let before = book.len();

    let lifetime = book.lifetime().clone();
    let id = ContactId::new("c1");
    let (result, _) = tokio::join!(book.delete(&id, &AlwaysConfirm), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        lifetime.close();
    });

    assert!(matches!(result, Err(Error::StaleMutation { .. })));
    assert_eq!(book.len(), before);
}

// ============================================================================
// Derived views
// ============================================================================

#[test]
fn test_filter_property() {
    let contacts = sample_contacts();
    let queries = ["", "ann", "ANN", "lee", "555", "0001", "e", "zzz", "020 7", " "];

    assert_eq!(filter_contacts(&contacts, "").len(), contacts.len());
    for q in queries {
        let filtered = filter_contacts(&contacts, q);
        for c in &filtered {
            let needle = q.to_lowercase();
            assert!(
                c.first_name.to_lowercase().contains(&needle)
                    || c.last_name.to_lowercase().contains(&needle)
                    || c.phone_number.contains(q),
                "{:?} does not match {:?}",
                c,
                q
            );
        }
        // Nothing matching is dropped
        let expected = contacts.iter().filter(|c| matches_query(c, q)).count();
        assert_eq!(filtered.len(), expected);
    }
}

#[test]
fn test_sort_property() {
    let contacts = sample_contacts();
    for key in [SortKey::FirstName, SortKey::LastName] {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let mut rows: Vec<&Contact> = contacts.iter().collect();
            sort_contacts(&mut rows, SortConfig::new(key, direction));

            // Permutation of the input
            assert_eq!(rows.len(), contacts.len());
            for c in &contacts {
                assert!(rows.iter().any(|r| r.id == c.id));
            }

            let value = |c: &Contact| match key {
                SortKey::FirstName => c.first_name.clone(),
                SortKey::LastName => c.last_name.clone(),
            };
            for pair in rows.windows(2) {
                let (a, b) = (value(pair[0]), value(pair[1]));
                match direction {
                    SortDirection::Ascending => assert!(a <= b),
                    SortDirection::Descending => assert!(a >= b),
                }
                // Stable on ties: input order kept
                if a == b {
                    let pos = |id: &ContactId| contacts.iter().position(|c| &c.id == id).unwrap();
                    assert!(pos(&pair[0].id) < pos(&pair[1].id));
                }
            }
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_scenario_add_contact_without_email() {
    let (mut book, _) = book_with(vec![]).await;
    book.set_draft(ContactDraft::new("Ann", "Lee", "555-0001", ""));
    book.submit().await.unwrap();

    assert_eq!(book.len(), 1);
    let row = &book.visible()[0];
    assert_eq!(format!("{} {}", row.full_name(), row.phone_number), "Ann Lee 555-0001");
    assert_eq!(row.email_display(), "N/A");
}

#[tokio::test]
async fn test_scenario_search_lee() {
    let (mut book, _) = book_with(vec![
        contact("a", "Ann", "Lee", "555-0001"),
        contact("b", "Bob", "Ray", "555-0002"),
    ])
    .await;

    book.set_search_query("lee");
    let visible = book.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].full_name(), "Ann Lee");
}

#[tokio::test]
async fn test_scenario_reselect_last_name_flips_direction() {
    let (mut book, _) = book_with(sample_contacts()).await;
    book.set_sort_config(SortConfig::new(SortKey::LastName, SortDirection::Ascending));

    book.select_sort_key(SortKey::LastName);
    assert_eq!(
        book.sort_config(),
        SortConfig::new(SortKey::LastName, SortDirection::Descending)
    );
}

#[tokio::test]
async fn test_switching_key_follows_policy() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());

    let mut keep = ContactBook::new(store.clone(), ViewLifetime::new());
    keep.set_sort_config(SortConfig::new(SortKey::FirstName, SortDirection::Descending));
    keep.select_sort_key(SortKey::LastName);
    assert_eq!(keep.sort_config().direction, SortDirection::Descending);

    let mut reset =
        ContactBook::new(store, ViewLifetime::new()).with_sort_policy(SortKeyChange::Reset);
    reset.set_sort_config(SortConfig::new(SortKey::FirstName, SortDirection::Descending));
    reset.select_sort_key(SortKey::LastName);
    assert_eq!(
        reset.sort_config(),
        SortConfig::new(SortKey::LastName, SortDirection::Ascending)
    );
}

// ============================================================================
// DuckDB-backed book
// ============================================================================

#[tokio::test]
async fn test_book_round_trip_through_duckdb_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("demo.duckdb");

    let created_id = {
        let store = Arc::new(DuckDbDocumentStore::new(&db_path).unwrap());
        let mut book = ContactBook::new(store, ViewLifetime::new());
        book.load().await.unwrap();
        book.set_draft(ContactDraft::new("Ann", "Lee", "555-0001", "ann@example.com"));
        book.submit().await.unwrap().id().clone()
    };

    let store = Arc::new(DuckDbDocumentStore::new(&db_path).unwrap());
    let mut book = ContactBook::new(store, ViewLifetime::new());
    let summary = book.load().await.unwrap();
    assert_eq!(summary.count, 1);
    assert!(summary.warnings.is_empty());
    assert_eq!(book.contacts()[0].id, created_id);
}
