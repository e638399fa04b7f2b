//! CLI command implementations

pub mod add;
pub mod auth;
pub mod demo;
pub mod edit;
pub mod list;
pub mod logs;
pub mod remove;
pub mod setup;
pub mod shell;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Input};

use contactbook_core::ports::Confirmer;
use contactbook_core::services::{
    AuthGate, ContactBook, EntryPoint, LogEvent, LoggingService, SubmitOutcome, ViewLifetime,
};
use contactbook_core::{Contact, ContactDraft, ContactbookContext, OperationResult, Session};

use crate::output;

/// Contact form fields given as flags
#[derive(Args, Debug, Default)]
pub struct ContactArgs {
    /// First name
    #[arg(long)]
    pub first_name: Option<String>,
    /// Last name
    #[arg(long)]
    pub last_name: Option<String>,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// Email (optional)
    #[arg(long)]
    pub email: Option<String>,
}

impl ContactArgs {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }

    /// Overwrite the given fields of `draft`, leaving the rest untouched
    pub fn apply(self, draft: &mut ContactDraft) {
        if let Some(v) = self.first_name {
            draft.first_name = v;
        }
        if let Some(v) = self.last_name {
            draft.last_name = v;
        }
        if let Some(v) = self.phone {
            draft.phone_number = v;
        }
        if let Some(v) = self.email {
            draft.email = v;
        }
    }
}

/// Prompt for every form field, pre-filled from `draft`
pub fn prompt_draft(draft: &mut ContactDraft) -> Result<()> {
    draft.first_name = prompt_field("First Name", &draft.first_name)?;
    draft.last_name = prompt_field("Last Name", &draft.last_name)?;
    draft.phone_number = prompt_field("Phone Number", &draft.phone_number)?;
    draft.email = prompt_field("Email (optional)", &draft.email)?;
    Ok(())
}

fn prompt_field(label: &str, current: &str) -> Result<String> {
    // Empty input is allowed so that validation reports every missing field at once
    let value: String = Input::new()
        .with_prompt(label)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}

/// Yes/no prompt on the terminal, defaulting to "no"
pub struct TerminalConfirm;

impl Confirmer for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> contactbook_core::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| std::io::Error::other(e).into())
    }
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let contactbook_dir = get_contactbook_dir().ok()?;
    LoggingService::new(&contactbook_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record a command run
///
/// Opens the event log only for the write so that `cb logs` can open it again.
pub fn log_command(command: &str) {
    if let Some(logger) = get_logger() {
        let _ = logger.log_command(command);
    }
}

/// Log a failed command, keeping the error code when it came from the core
pub fn log_failure(command: &str, error: &anyhow::Error) {
    log_event(&get_logger(), failure_event(error).with_command(command));
}

pub fn failure_event(error: &anyhow::Error) -> LogEvent {
    match error.downcast_ref::<contactbook_core::Error>() {
        Some(core_error) => LogEvent::from_error("command_failed", core_error),
        None => LogEvent::new("command_failed").with_error(format!("{:#}", error)),
    }
}

/// Get the contactbook directory from environment or default, creating it if needed
pub fn get_contactbook_dir() -> Result<PathBuf> {
    let dir = match std::env::var("CONTACTBOOK_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .join(".contactbook"),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create contactbook directory: {:?}", dir))?;
    Ok(dir)
}

/// Get contactbook context
pub fn get_context() -> Result<ContactbookContext> {
    let contactbook_dir = get_contactbook_dir()?;
    ContactbookContext::new(&contactbook_dir).context("Failed to initialize contactbook context")
}

/// Run a future to completion on a single-threaded runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    Ok(runtime.block_on(future))
}

/// Pass the auth gate and return the signed-in session
///
/// Resolves the stored session, then waits for the gate's decision. A
/// signed-out user gets an error pointing at `cb login`.
pub async fn require_session(ctx: &ContactbookContext) -> Result<Session> {
    let mut gate = AuthGate::new();
    gate.mount(ctx.sessions.as_ref());

    if let Err(e) = ctx.sessions.resolve().await {
        if e.is_retryable() {
            return Err(e).context("Could not renew the stored session");
        }
        eprintln!("{}", e.to_string().yellow());
    }

    gate.resolved(ctx.auth_timeout()).await?;
    gate.require_access()?;
    gate.unmount();

    ctx.sessions
        .current()
        .ok_or_else(|| anyhow!("Session changed while signing in; try again"))
}

/// Pass the auth gate and load the contact book for the signed-in user
pub async fn open_book(ctx: &ContactbookContext, lifetime: ViewLifetime) -> Result<ContactBook> {
    let session = require_session(ctx).await?;
    let mut book = ctx.contact_book(&session, lifetime)?;

    let spinner = output::spinner("Loading contacts...");
    let loaded = book.load().await;
    spinner.finish_and_clear();

    let summary = loaded?;
    for warning in &summary.warnings {
        eprintln!("{}", warning.yellow());
    }
    Ok(book)
}

/// Submit the book's draft, prompting for the fields first when interactive
///
/// Interactive runs keep the draft and ask again after a validation error,
/// and offer a retry after a transient failure.
pub async fn submit_form(book: &mut ContactBook, interactive: bool) -> Result<SubmitOutcome> {
    loop {
        if interactive {
            prompt_draft(book.draft_mut())?;
        }

        let spinner = output::spinner("Saving contact...");
        let submitted = book.submit().await;
        spinner.finish_and_clear();

        match submitted {
            Err(contactbook_core::Error::Validation(e)) if interactive => {
                output::error(&e.to_string());
            }
            Err(e) if interactive && e.is_retryable() => {
                output::error(&e.to_string());
                if !Confirm::new().with_prompt("Retry?").default(true).interact()? {
                    return Err(e.into());
                }
            }
            other => return Ok(other?),
        }
    }
}

/// Print the contact a submit produced
pub fn report_submit(book: &ContactBook, outcome: &SubmitOutcome, json: bool) -> Result<()> {
    let contact = book.get(outcome.id()).cloned();

    if json {
        let result: OperationResult<Option<Contact>> = OperationResult::ok(contact);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let verb = match outcome {
        SubmitOutcome::Created(_) => "Added",
        SubmitOutcome::Updated(_) => "Updated",
    };
    match contact {
        Some(c) => output::success(&format!("{} {} ({})", verb, c.full_name(), c.id)),
        None => output::success(&format!("{} contact {}", verb, outcome.id())),
    }
    Ok(())
}
