//! Ranked judgment strategies for the structural check.
//!
//! Advisory strategies may abstain; the syllable-count judge never does and
//! always closes the chain.

use crate::model::form::FormRule;
use crate::model::verdict::Rejection;
use crate::oracle::{OracleAdapter, OracleJudgment};
use crate::prosody::syllables::SyllableEstimator;

/// One structural question: does `line` fit `rule` at `position`?
#[derive(Debug, Clone, Copy)]
pub struct LineRequest<'a> {
    pub line: &'a str,
    /// 1-indexed line position.
    pub position: u32,
    pub rule: &'a FormRule,
    pub expected_syllables: u32,
}

/// Result of asking one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Accept,
    Reject(Rejection),
    /// No decisive answer; the next strategy is consulted. `note` carries
    /// any explanation worth surfacing if a later strategy rejects.
    Abstain { note: Option<String> },
}

/// A judgment strategy in the validator chain.
pub trait LineJudge: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;
    fn judge(&self, request: &LineRequest<'_>) -> StrategyOutcome;
}

/// Oracle-backed advisory strategy.
///
/// Trusted on `Pass`; a `Fail` or inconclusive answer defers to the
/// estimator, keeping the oracle's explanation as a note.
pub struct OracleJudge {
    adapter: OracleAdapter,
}

impl OracleJudge {
    pub fn new(adapter: OracleAdapter) -> Self {
        Self { adapter }
    }
}

impl LineJudge for OracleJudge {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn judge(&self, request: &LineRequest<'_>) -> StrategyOutcome {
        match self
            .adapter
            .judge(request.line, request.position, request.rule.form)
        {
            OracleJudgment::Pass => StrategyOutcome::Accept,
            OracleJudgment::Fail { explanation } => StrategyOutcome::Abstain {
                note: Some(explanation),
            },
            OracleJudgment::Inconclusive(_) => StrategyOutcome::Abstain { note: None },
        }
    }
}

/// Authoritative strategy: strict equality against the estimator count.
#[derive(Debug, Clone, Default)]
pub struct SyllableCountJudge {
    estimator: SyllableEstimator,
}

impl SyllableCountJudge {
    pub fn new(estimator: SyllableEstimator) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &SyllableEstimator {
        &self.estimator
    }
}

impl LineJudge for SyllableCountJudge {
    fn name(&self) -> &'static str {
        "syllable_estimator"
    }

    fn judge(&self, request: &LineRequest<'_>) -> StrategyOutcome {
        let observed = self.estimator.estimate_line(request.line);
        if observed == request.expected_syllables {
            StrategyOutcome::Accept
        } else {
            StrategyOutcome::Reject(Rejection::SyllableMismatch {
                position: request.position,
                expected: request.expected_syllables,
                observed,
                oracle_note: None,
            })
        }
    }
}
