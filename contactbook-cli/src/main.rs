//! Contactbook CLI - your contacts in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use contactbook_core::SortKey;

mod commands;
mod output;

use commands::{add, auth, demo, edit, list, logs, remove, setup, shell, ContactArgs};

/// Contactbook - a personal contact list backed by Firestore
#[derive(Parser)]
#[command(name = "cb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: Option<String>,
        /// Account password (prompted when omitted)
        #[arg(long, env = "CONTACTBOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List contacts
    List {
        /// Case-insensitive filter on first name, last name or phone number
        #[arg(long, short)]
        search: Option<String>,
        /// Sort key (first-name, last-name)
        #[arg(long, default_value = "first-name")]
        sort: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a contact
    Add {
        #[command(flatten)]
        fields: ContactArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a contact
    Edit {
        /// Contact ID
        id: String,
        #[command(flatten)]
        fields: ContactArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a contact
    Remove {
        /// Contact ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive contact list with form, search and sorting
    Shell,

    /// Configure the Firebase project
    Setup {
        /// Web API key
        #[arg(long)]
        api_key: Option<String>,
        /// Project ID
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Whoami { .. } => "whoami",
            Commands::List { .. } => "list",
            Commands::Add { .. } => "add",
            Commands::Edit { .. } => "edit",
            Commands::Remove { .. } => "remove",
            Commands::Shell => "shell",
            Commands::Setup { .. } => "setup",
            Commands::Demo { .. } => "demo",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let name = cli.command.name();

    commands::log_command(name);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_failure(name, &e);
            if output::needs_report(&e) {
                output::error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => auth::login(email, password),
        Commands::Logout => auth::logout(),
        Commands::Whoami { json } => auth::whoami(json),
        Commands::List { search, sort, desc, json } => list::run(search.as_deref(), sort, desc, json),
        Commands::Add { fields, json } => add::run(fields, json),
        Commands::Edit { id, fields, json } => edit::run(&id, fields, json),
        Commands::Remove { id, force, json } => remove::run(&id, force, json),
        Commands::Shell => shell::run(),
        Commands::Setup { api_key, project_id } => setup::run(api_key, project_id),
        Commands::Demo { command } => demo::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
