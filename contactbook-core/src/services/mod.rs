//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one feature area.

pub mod auth_gate;
pub mod contact_book;
mod demo;
pub mod logging;
pub mod migration;
pub mod session;

pub use auth_gate::{AuthGate, GateDecision, GateState, LOGIN_ENTRY_POINT};
pub use contact_book::{ContactBook, DeleteOutcome, LoadSummary, SubmitOutcome, ViewLifetime};
pub use demo::{DemoService, DEMO_DB_FILE};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use session::{LocalSessionProvider, SessionHub};
