//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_contactbook_dir;
use contactbook_core::services::DemoService;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off {
        /// Also delete the local demo contacts
        #[arg(long)]
        clean: bool,
    },
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let contactbook_dir = get_contactbook_dir()?;
    let demo_service = DemoService::new(&contactbook_dir);

    match command {
        Some(DemoCommands::On) => {
            let seeded = demo_service.enable()?;
            println!("{}", "Demo mode enabled".green());
            println!(
                "{} sample contacts are stored locally. Run 'cb login' with any email, then 'cb list'.",
                seeded
            );
        }
        Some(DemoCommands::Off { clean }) => {
            demo_service.disable(clean)?;
            println!("{}", "Demo mode disabled".yellow());
            println!("Run 'cb login' to sign in to your Firebase project.");
        }
        Some(DemoCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Demo mode is {}", "ON".green());
                println!("  Contacts: {}", demo_service.db_path().display());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
        }
    }
    Ok(())
}
