//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod logging;
pub mod migration;
mod rules;
mod status;

pub use logging::{events, EntryPoint, LogEntry, LogEvent, LogQuery, LoggingService, RuleActivity};
pub use migration::{MigrationResult, MigrationService};
pub use rules::RuleService;
pub use status::{StatusService, StatusSummary, TypeCount};
