//! Edit command - update every field of an existing contact

use anyhow::{bail, Result};

use contactbook_core::services::ViewLifetime;
use contactbook_core::ContactId;

use super::{block_on, get_context, open_book, report_submit, submit_form, ContactArgs};

pub fn run(id: &str, fields: ContactArgs, json: bool) -> Result<()> {
    let interactive = fields.is_empty();
    if interactive && json {
        bail!("--json needs the changed fields as flags");
    }

    let ctx = get_context()?;
    let id = ContactId::new(id);
    block_on(async {
        let mut book = open_book(&ctx, ViewLifetime::new()).await?;
        // Fields not given as flags keep their stored values
        book.begin_edit(&id)?;
        fields.apply(book.draft_mut());

        let outcome = submit_form(&mut book, interactive).await?;
        report_submit(&book, &outcome, json)
    })?
}
