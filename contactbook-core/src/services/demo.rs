//! Demo service - manage demo mode
//!
//! Demo mode swaps the hosted services for a local DuckDB contact store and
//! a sign-in that accepts any email, so the app can be tried without a
//! Firebase project.

use std::path::{Path, PathBuf};

use crate::adapters::demo::generate_demo_contacts;
use crate::adapters::duckdb::DuckDbDocumentStore;
use crate::config::Config;
use crate::domain::result::Result;

pub const DEMO_DB_FILE: &str = "demo.duckdb";

/// Demo service for managing demo mode
pub struct DemoService {
    contactbook_dir: PathBuf,
}

impl DemoService {
    pub fn new(contactbook_dir: &Path) -> Self {
        Self {
            contactbook_dir: contactbook_dir.to_path_buf(),
        }
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(Config::load(&self.contactbook_dir)?.demo_mode)
    }

    pub fn db_path(&self) -> PathBuf {
        self.contactbook_dir.join(DEMO_DB_FILE)
    }

    /// Enable demo mode with a freshly seeded store
    ///
    /// Returns the number of seeded contacts.
    pub fn enable(&self) -> Result<usize> {
        self.remove_database()?;

        let mut config = Config::load(&self.contactbook_dir)?;
        config.enable_demo_mode();
        config.save(&self.contactbook_dir)?;

        let store = DuckDbDocumentStore::new(&self.db_path())?;
        let contacts = generate_demo_contacts();
        store.insert_contacts(&contacts)?;
        Ok(contacts.len())
    }

    /// Disable demo mode, optionally deleting the demo store
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.contactbook_dir)?;
        config.disable_demo_mode();
        config.save(&self.contactbook_dir)?;

        if clean {
            self.remove_database()?;
        }
        Ok(())
    }

    fn remove_database(&self) -> Result<()> {
        let db = self.db_path();
        let wal = self.contactbook_dir.join(format!("{}.wal", DEMO_DB_FILE));
        for path in [db, wal] {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
