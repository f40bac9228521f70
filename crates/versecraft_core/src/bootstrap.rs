//! Process wiring from `CoreConfig`.
//!
//! # Responsibility
//! - Build the syllable estimator and contribution validator from config.
//! - Normalize setup failures into `BootstrapError`.

use crate::config::{CoreConfig, OracleConfig, ProsodyConfig};
use crate::oracle::{HttpOracleClient, OracleAdapter, OracleError};
use crate::prosody::dictionary::{DictionaryError, PronouncingDictionary};
use crate::prosody::syllables::SyllableEstimator;
use crate::validation::ContributionValidator;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum BootstrapError {
    Dictionary(DictionaryError),
    Oracle(OracleError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dictionary(err) => write!(f, "{err}"),
            Self::Oracle(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dictionary(err) => Some(err),
            Self::Oracle(err) => Some(err),
        }
    }
}

impl From<DictionaryError> for BootstrapError {
    fn from(value: DictionaryError) -> Self {
        Self::Dictionary(value)
    }
}

impl From<OracleError> for BootstrapError {
    fn from(value: OracleError) -> Self {
        Self::Oracle(value)
    }
}

/// Seed dictionary, with `prosody.dictionary_path` merged over it.
///
/// Logs a `seed_only` warning when no full dictionary is configured.
pub fn build_estimator(config: &ProsodyConfig) -> Result<SyllableEstimator, BootstrapError> {
    let mut dictionary = PronouncingDictionary::seed();
    match &config.dictionary_path {
        Some(path) => {
            dictionary.merge_file(path)?;
            info!(
                "event=dictionary_load module=prosody status=ok path={} entries={}",
                path.display(),
                dictionary.len()
            );
        }
        None => warn!(
            "event=dictionary_load module=prosody status=seed_only entries={} accuracy=reduced hint=prosody.dictionary_path",
            dictionary.len()
        ),
    }
    Ok(SyllableEstimator::new(dictionary))
}

/// Estimator-only validator, or oracle-first when `oracle.enabled`.
pub fn build_validator(config: &CoreConfig) -> Result<ContributionValidator, BootstrapError> {
    let estimator = build_estimator(&config.prosody)?;
    if !config.oracle.enabled {
        info!("event=validator_build module=core status=ok oracle=disabled");
        return Ok(ContributionValidator::new(estimator));
    }

    let client = build_oracle_client(&config.oracle)?;
    info!(
        "event=validator_build module=core status=ok oracle=enabled model={} timeout_ms={}",
        config.oracle.model, config.oracle.timeout_ms
    );
    Ok(ContributionValidator::with_oracle(
        OracleAdapter::new(Arc::new(client)),
        estimator,
    ))
}

fn build_oracle_client(config: &OracleConfig) -> Result<HttpOracleClient, BootstrapError> {
    Ok(HttpOracleClient::from_config(config)?)
}
