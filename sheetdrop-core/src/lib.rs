//! SheetDrop Core - Email filtering rules for SheetDrop
//!
//! This crate implements the rule domain following hexagonal architecture:
//!
//! - **domain**: Filter type registry, rule classification, form model and
//!   display formatting
//! - **ports**: Trait definitions for external dependencies (RuleRepository)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, SheetDrop REST API)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRuleRepository;
use adapters::rest::RestRuleRepository;
use config::{Backend, Config};
use ports::RuleRepository;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    classify, FieldKind, FieldName, FilterField, FilterType, FilterTypeConfig, MatchType, Rule,
    RuleDisplayInfo, RuleFilter, RuleForm, RuleFormData, RulePayload, Submission, Validation,
};
pub use domain::filter_type::lookup;
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LogEvent, LogQuery, LoggingService, RuleActivity};

/// Main context for SheetDrop operations
///
/// Holds the configuration, the repository selected by it, and the
/// services built on top of that repository.
pub struct SheetDropContext {
    pub config: Config,
    pub repository: Arc<dyn RuleRepository>,
    pub rule_service: RuleService,
    pub status_service: StatusService,
}

impl SheetDropContext {
    /// Create a context from the settings in `sheetdrop_dir`
    pub fn new(sheetdrop_dir: &Path) -> Result<Self> {
        let config = Config::load(sheetdrop_dir)?;
        Self::with_config(sheetdrop_dir, config)
    }

    /// Create a context with an already resolved configuration
    pub fn with_config(sheetdrop_dir: &Path, config: Config) -> Result<Self> {
        let repository: Arc<dyn RuleRepository> = match config.backend {
            Backend::Local => {
                std::fs::create_dir_all(sheetdrop_dir)?;
                let repo = DuckDbRuleRepository::new(&sheetdrop_dir.join("rules.duckdb"))?;
                repo.ensure_schema()?;
                Arc::new(repo)
            }
            Backend::Remote => Arc::new(RestRuleRepository::new(
                &config.api_base_url,
                config.api_token.as_deref(),
            )?),
        };

        let rule_service = RuleService::new(Arc::clone(&repository));
        let status_service = StatusService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            rule_service,
            status_service,
        })
    }

    /// Attach an event logger to the rule service
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.rule_service = self.rule_service.with_logger(logger);
        self
    }
}
