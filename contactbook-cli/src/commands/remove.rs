//! Remove command - delete a contact after confirmation

use anyhow::{bail, Result};
use colored::Colorize;

use contactbook_core::ports::{AlwaysConfirm, Confirmer};
use contactbook_core::services::{DeleteOutcome, ViewLifetime};
use contactbook_core::{ContactId, OperationResult};

use super::{block_on, get_context, open_book, TerminalConfirm};
use crate::output;

/// Pick who confirms the delete; only `--force` skips the prompt
fn confirmer(force: bool, json: bool) -> Result<&'static dyn Confirmer> {
    if force {
        return Ok(&AlwaysConfirm);
    }
    if json {
        bail!("--json cannot prompt for confirmation; pass --force to delete");
    }
    Ok(&TerminalConfirm)
}

pub fn run(id: &str, force: bool, json: bool) -> Result<()> {
    let confirmer = confirmer(force, json)?;
    let ctx = get_context()?;
    let id = ContactId::new(id);

    let outcome = block_on(async {
        let mut book = open_book(&ctx, ViewLifetime::new()).await?;
        Ok::<_, anyhow::Error>(book.delete(&id, confirmer).await?)
    })??;

    if json {
        let removed = matches!(outcome, DeleteOutcome::Deleted(_));
        let result = OperationResult::ok(serde_json::json!({ "id": id, "deleted": removed }));
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match outcome {
        DeleteOutcome::Deleted(id) => output::success(&format!("Contact {} removed", id)),
        DeleteOutcome::Declined => println!("{}", "Cancelled".dimmed()),
    }
    Ok(())
}
