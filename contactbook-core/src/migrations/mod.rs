//! Demo store migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with include_str! and applied
//! in name order by `MigrationService`.

/// All demo store migrations. Format: (filename, sql_content)
///
/// When adding a migration, create `NNN_description.sql` and append it here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_contacts.sql", include_str!("001_contacts.sql")),
];
