//! Setup command - store the Firebase project settings

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Input;

use contactbook_core::config::Config;

use super::get_contactbook_dir;
use crate::output;

pub fn run(api_key: Option<String>, project_id: Option<String>) -> Result<()> {
    let contactbook_dir = get_contactbook_dir()?;
    let mut config = Config::load(&contactbook_dir)?;

    if config.demo_mode {
        output::warning("Demo mode is on; these settings take effect after 'cb demo off'.");
    }

    let api_key = match api_key {
        Some(k) => k,
        None => Input::new()
            .with_prompt("Firebase Web API key")
            .with_initial_text(config.firebase.api_key.clone().unwrap_or_default())
            .interact_text()?,
    };
    let project_id = match project_id {
        Some(p) => p,
        None => Input::new()
            .with_prompt("Firebase project ID")
            .with_initial_text(config.firebase.project_id.clone().unwrap_or_default())
            .interact_text()?,
    };

    let (api_key, project_id) = (api_key.trim(), project_id.trim());
    if api_key.is_empty() || project_id.is_empty() {
        bail!("Both the API key and the project ID are required");
    }

    config.set_firebase(api_key, project_id);
    config.save(&contactbook_dir)?;

    println!("{} Firebase project '{}' configured", "Success!".green(), project_id);
    println!("Run 'cb login' to sign in.");
    Ok(())
}
