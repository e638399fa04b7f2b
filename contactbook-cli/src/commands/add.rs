//! Add command - create a contact from flags or prompts

use anyhow::{bail, Result};

use contactbook_core::services::ViewLifetime;

use super::{block_on, get_context, open_book, report_submit, submit_form, ContactArgs};

pub fn run(fields: ContactArgs, json: bool) -> Result<()> {
    let interactive = fields.is_empty();
    if interactive && json {
        bail!("--json needs the contact fields as flags (--first-name, --last-name, --phone)");
    }

    let ctx = get_context()?;
    block_on(async {
        let mut book = open_book(&ctx, ViewLifetime::new()).await?;
        fields.apply(book.draft_mut());

        let outcome = submit_form(&mut book, interactive).await?;
        report_submit(&book, &outcome, json)
    })?
}
