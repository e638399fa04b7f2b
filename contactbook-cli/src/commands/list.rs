//! List command - show contacts with search and sorting

use anyhow::Result;
use colored::Colorize;

use contactbook_core::services::ViewLifetime;
use contactbook_core::{Contact, OperationResult, SortConfig, SortDirection, SortKey};

use super::{block_on, get_context, open_book};
use crate::output;

pub fn run(search: Option<&str>, sort: SortKey, desc: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let loaded = block_on(open_book(&ctx, ViewLifetime::new()))?;

    let mut book = match loaded {
        Ok(book) => book,
        Err(e) if json => {
            let result = match e.downcast_ref::<contactbook_core::Error>() {
                Some(core_error) => OperationResult::<Vec<Contact>>::from_error(core_error),
                None => OperationResult::fail(format!("{:#}", e)),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Err(e.context(output::ReportedAsJson));
        }
        Err(e) => return Err(e),
    };

    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    book.set_sort_config(SortConfig::new(sort, direction));
    if let Some(query) = search {
        book.set_search_query(query);
    }

    let visible = book.visible();

    if json {
        let contacts: Vec<Contact> = visible.into_iter().cloned().collect();
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(contacts))?);
        return Ok(());
    }

    if visible.is_empty() {
        if book.is_empty() {
            output::info("No contacts yet. Run 'cb add' to create one.");
        } else {
            println!("No contacts match '{}'.", book.search_query());
        }
        return Ok(());
    }

    println!("{}", output::contacts_table(&visible, false));
    println!(
        "{}",
        format!(
            "{} of {} contacts, sorted by {} ({})",
            visible.len(),
            book.len(),
            sort.label(),
            direction
        )
        .dimmed()
    );
    Ok(())
}
