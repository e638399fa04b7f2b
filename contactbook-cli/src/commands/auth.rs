//! Login, logout and whoami commands

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};

use super::{block_on, get_context};
use crate::output;

pub fn login(email: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = get_context()?;

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        // Demo sign-in ignores the password
        None if ctx.config.demo_mode => String::new(),
        None => Password::new().with_prompt("Password").interact()?,
    };

    let spinner = output::spinner("Signing in...");
    let signed_in = block_on(ctx.sessions.sign_in(email.trim(), &password));
    spinner.finish_and_clear();
    let session = signed_in??;

    output::success(&format!("Signed in as {}", session.email));
    if ctx.config.demo_mode {
        println!("{}", "Demo mode is on; contacts are stored locally.".dimmed());
    }
    Ok(())
}

pub fn logout() -> Result<()> {
    let ctx = get_context()?;
    ctx.sessions.sign_out()?;
    output::success("Signed out");
    Ok(())
}

pub fn whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = block_on(ctx.sessions.resolve())??;

    if json {
        let value = match &session {
            Some(s) => serde_json::json!({
                "signedIn": true,
                "uid": s.uid,
                "email": s.email,
                "expiresAt": s.expires_at,
                "backend": ctx.backend_name(),
            }),
            None => serde_json::json!({ "signedIn": false }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match session {
        Some(s) => {
            println!("Signed in as {}", s.email.bold());
            println!("  User ID: {}", s.uid);
            if let Some(expires_at) = s.expires_at {
                println!(
                    "  Token expires: {}",
                    expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            println!("  Backend: {}", ctx.backend_name());
        }
        None => {
            output::info("Not signed in. Run 'cb login' to sign in.");
        }
    }
    Ok(())
}
