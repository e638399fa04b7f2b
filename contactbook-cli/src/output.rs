//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

use contactbook_core::Contact;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Context marking a failure already printed to stdout as a JSON envelope
#[derive(Debug)]
pub struct ReportedAsJson;

impl fmt::Display for ReportedAsJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failure reported as JSON")
    }
}

/// Whether `main` still has to print this failure
pub fn needs_report(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ReportedAsJson>().is_none()
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Contacts as a table, optionally with a leading row number column
pub fn contacts_table(contacts: &[&Contact], numbered: bool) -> Table {
    let mut table = create_table();
    let mut header = vec!["First Name", "Last Name", "Phone Number", "Email", "ID"];
    if numbered {
        header.insert(0, "#");
    }
    table.set_header(header);

    for (index, contact) in contacts.iter().enumerate() {
        let mut row = vec![
            contact.first_name.clone(),
            contact.last_name.clone(),
            contact.phone_number.clone(),
            contact.email_display().to_string(),
            contact.id.to_string(),
        ];
        if numbered {
            row.insert(0, (index + 1).to_string());
        }
        table.add_row(row);
    }
    table
}

/// Spinner for a remote call; hidden when stdout is not a terminal
pub fn spinner(msg: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stdout) {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reported_failure_keeps_core_error() {
        let error = anyhow::Error::new(contactbook_core::Error::not_found("contact c1"))
            .context(ReportedAsJson);
        assert!(!needs_report(&error));
        assert!(error.downcast_ref::<contactbook_core::Error>().is_some());

        let plain = anyhow::anyhow!("boom");
        assert!(needs_report(&plain));
    }
}
