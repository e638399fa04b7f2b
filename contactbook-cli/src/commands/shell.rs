//! Shell command - interactive contact list
//!
//! One contact view for the whole session: the form (add or update), search,
//! the two sort toggles, and edit/delete per row. Ctrl-C during a remote call
//! closes the view, so a result arriving afterwards is discarded.

use std::future::Future;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Select};

use contactbook_core::services::{
    ContactBook, DeleteOutcome, EntryPoint, LogEvent, LoggingService, SubmitOutcome, ViewLifetime,
};
use contactbook_core::{ContactId, SortDirection, SortKey};

use super::{
    block_on, failure_event, get_contactbook_dir, get_context, log_event, open_book, prompt_draft,
    TerminalConfirm,
};
use crate::output;

#[derive(Debug, Clone, Copy)]
enum Action {
    Form,
    CancelEdit,
    Search,
    Sort(SortKey),
    Edit,
    Delete,
    Reload,
    Quit,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Form => "submit",
            Action::CancelEdit => "cancel_edit",
            Action::Search => "search",
            Action::Sort(_) => "sort",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Reload => "reload",
            Action::Quit => "quit",
        }
    }
}

pub fn run() -> Result<()> {
    let ctx = get_context()?;
    let logger = get_contactbook_dir().ok().and_then(|dir| {
        LoggingService::new(&dir, EntryPoint::Shell, env!("CARGO_PKG_VERSION")).ok()
    });
    let lifetime = ViewLifetime::new();

    block_on(async {
        let mut book = open_book(&ctx, lifetime.clone()).await?;
        let result = shell_loop(&mut book, &lifetime, &logger).await;
        lifetime.close();
        result
    })?
}

async fn shell_loop(
    book: &mut ContactBook,
    lifetime: &ViewLifetime,
    logger: &Option<LoggingService>,
) -> Result<()> {
    output::info("Contactbook shell. Press Ctrl-C during a request to close the view.");

    loop {
        render(book);

        let actions = menu(book);
        let labels: Vec<String> = actions.iter().map(|a| action_label(book, *a)).collect();
        let choice = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact_opt()?;
        let action = match choice {
            Some(index) => actions[index],
            None => Action::Quit,
        };

        if let Action::Quit = action {
            return Ok(());
        }

        log_event(
            logger,
            LogEvent::new("shell_action")
                .with_command(action.name())
                .with_backend(book.store_name()),
        );

        if let Err(e) = perform(book, lifetime, action).await {
            let event = failure_event(&e)
                .with_command(action.name())
                .with_backend(book.store_name());
            log_event(logger, event);
            output::error(&format!("{:#}", e));

            if !lifetime.is_open() {
                return Ok(());
            }
        }
    }
}

fn menu(book: &ContactBook) -> Vec<Action> {
    let mut actions = vec![Action::Form];
    if book.is_editing() {
        actions.push(Action::CancelEdit);
    }
    actions.extend([
        Action::Search,
        Action::Sort(SortKey::FirstName),
        Action::Sort(SortKey::LastName),
    ]);
    if !book.is_empty() {
        actions.extend([Action::Edit, Action::Delete]);
    }
    actions.extend([Action::Reload, Action::Quit]);
    actions
}

fn action_label(book: &ContactBook, action: Action) -> String {
    match action {
        Action::Form => book.submit_label().to_string(),
        Action::CancelEdit => "Cancel edit".to_string(),
        Action::Search => "Search".to_string(),
        Action::Sort(key) => {
            let sort = book.sort_config();
            if sort.key == key {
                let arrow = match sort.direction {
                    SortDirection::Ascending => "↑",
                    SortDirection::Descending => "↓",
                };
                format!("Sort by {} {}", key.label(), arrow)
            } else {
                format!("Sort by {}", key.label())
            }
        }
        Action::Edit => "Edit a contact".to_string(),
        Action::Delete => "Delete a contact".to_string(),
        Action::Reload => "Reload".to_string(),
        Action::Quit => "Quit".to_string(),
    }
}

fn render(book: &ContactBook) {
    let visible = book.visible();
    println!();
    if visible.is_empty() {
        if book.is_empty() {
            println!("{}", "No contacts yet.".dimmed());
        } else {
            println!("{}", format!("No contacts match '{}'.", book.search_query()).dimmed());
        }
    } else {
        println!("{}", output::contacts_table(&visible, true));
    }

    let sort = book.sort_config();
    let mut status = format!(
        "{} of {} contacts, sorted by {} ({})",
        visible.len(),
        book.len(),
        sort.key.label(),
        sort.direction
    );
    if !book.search_query().is_empty() {
        status.push_str(&format!(", search '{}'", book.search_query()));
    }
    if let Some(id) = book.editing_id() {
        status.push_str(&format!(", editing {}", id));
    }
    println!("{}", status.dimmed());
}

async fn perform(book: &mut ContactBook, lifetime: &ViewLifetime, action: Action) -> Result<()> {
    match action {
        Action::Form => {
            prompt_draft(book.draft_mut())?;
            let spinner = output::spinner("Saving contact...");
            let submitted = until_closed(lifetime, book.submit()).await;
            spinner.finish_and_clear();
            match submitted? {
                SubmitOutcome::Created(id) => output::success(&format!("Added contact {}", id)),
                SubmitOutcome::Updated(id) => output::success(&format!("Updated contact {}", id)),
            }
        }
        Action::CancelEdit => book.cancel_edit(),
        Action::Search => {
            let query: String = Input::new()
                .with_prompt("Search (empty to clear)")
                .with_initial_text(book.search_query())
                .allow_empty(true)
                .interact_text()?;
            book.set_search_query(query);
        }
        Action::Sort(key) => book.select_sort_key(key),
        Action::Edit => {
            if let Some(id) = pick_contact(book, "Edit which contact?")? {
                book.begin_edit(&id)?;
                output::info(&format!(
                    "Editing {}. Choose '{}' to save or 'Cancel edit' to discard.",
                    id,
                    book.submit_label()
                ));
            }
        }
        Action::Delete => {
            if let Some(id) = pick_contact(book, "Delete which contact?")? {
                match until_closed(lifetime, book.delete(&id, &TerminalConfirm)).await? {
                    DeleteOutcome::Deleted(id) => output::success(&format!("Contact {} removed", id)),
                    DeleteOutcome::Declined => println!("{}", "Cancelled".dimmed()),
                }
            }
        }
        Action::Reload => {
            let spinner = output::spinner("Loading contacts...");
            let loaded = until_closed(lifetime, book.load()).await;
            spinner.finish_and_clear();
            let summary = loaded?;
            for warning in &summary.warnings {
                output::warning(warning);
            }
            output::info(&format!("Loaded {} contacts", summary.count));
        }
        Action::Quit => {}
    }
    Ok(())
}

/// Choose one of the visible rows
fn pick_contact(book: &ContactBook, prompt: &str) -> Result<Option<ContactId>> {
    let visible = book.visible();
    if visible.is_empty() {
        output::warning("No contacts to choose from");
        return Ok(None);
    }

    let labels: Vec<String> = visible
        .iter()
        .map(|c| format!("{} ({})", c.full_name(), c.phone_number))
        .collect();
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|index| visible[index].id.clone()))
}

/// Await a store operation; Ctrl-C closes the view and lets it finish stale
async fn until_closed<T, F>(lifetime: &ViewLifetime, operation: F) -> contactbook_core::Result<T>
where
    F: Future<Output = contactbook_core::Result<T>>,
{
    tokio::pin!(operation);
    tokio::select! {
        result = &mut operation => result,
        _ = tokio::signal::ctrl_c() => {
            lifetime.close();
            operation.await
        }
    }
}
