//! Core domain logic for VerseCraft collaborative poems.
//! This crate is the single source of truth for contribution rules.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod oracle;
pub mod prosody;
pub mod repo;
pub mod service;
pub mod validation;

pub use bootstrap::{build_estimator, build_validator, BootstrapError};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_busy_timeout, DbError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::form::{rules_for, rules_for_name, FormRule, FormType, LineLimit, UnknownFormType};
pub use model::poem::{AuthorId, Contribution, Poem, PoemId, PoemSnapshot, PoemState};
pub use model::verdict::{Rejection, Verdict};
pub use oracle::{HttpOracleClient, OracleAdapter, OracleClient, OracleError, OracleJudgment};
pub use prosody::syllables::SyllableEstimator;
pub use repo::poem_repo::{
    PoemListFilter, PoemRepository, RepoError, RepoResult, SqlitePoemRepository,
};
pub use service::poem_service::{
    PoemService, PublishBlocker, ServiceError, ServiceResult, Submission,
};
pub use validation::ContributionValidator;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
