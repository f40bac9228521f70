//! Contribution validation engine.
//!
//! # Responsibility
//! - Decide whether a candidate line may join a poem.
//! - Compose structural judgment strategies, first decisive answer wins.
//!
//! # Invariants
//! - Checks run in a fixed order and the first failure wins:
//!   completeness, collaborator, turn-taking, empty line, structure.
//! - Validation never mutates state and never returns an error; rejections
//!   are `Verdict::Fail` values.
//! - The syllable estimator is the final authority for syllable contracts.

pub mod strategy;

use crate::model::poem::{AuthorId, Contribution, Poem};
use crate::model::verdict::{Rejection, Verdict};
use crate::oracle::OracleAdapter;
use crate::prosody::syllables::SyllableEstimator;
use log::debug;
use strategy::{LineJudge, LineRequest, OracleJudge, StrategyOutcome, SyllableCountJudge};

/// Stateless validator shared by all submissions.
pub struct ContributionValidator {
    /// Consulted in order before the authority; may abstain.
    advisors: Vec<Box<dyn LineJudge>>,
    authority: SyllableCountJudge,
}

impl ContributionValidator {
    /// Validator that relies on the estimator alone.
    pub fn new(estimator: SyllableEstimator) -> Self {
        Self::with_advisors(Vec::new(), estimator)
    }

    /// Oracle first, estimator as tie-breaker.
    pub fn with_oracle(adapter: OracleAdapter, estimator: SyllableEstimator) -> Self {
        Self::with_advisors(vec![Box::new(OracleJudge::new(adapter))], estimator)
    }

    /// Custom ranked advisors followed by the estimator.
    pub fn with_advisors(advisors: Vec<Box<dyn LineJudge>>, estimator: SyllableEstimator) -> Self {
        Self {
            advisors,
            authority: SyllableCountJudge::new(estimator),
        }
    }

    pub fn estimator(&self) -> &SyllableEstimator {
        self.authority.estimator()
    }

    /// Validates `candidate` by `author` against `poem` and its accepted
    /// `lines` (ordered by position).
    pub fn validate(
        &self,
        poem: &Poem,
        lines: &[Contribution],
        candidate: &str,
        author: AuthorId,
    ) -> Verdict {
        let rule = poem.rule();
        let accepted = u32::try_from(lines.len()).unwrap_or(u32::MAX);

        if poem.is_complete() || rule.max_lines.is_reached_by(accepted) {
            return self.reject(
                poem,
                Rejection::PoemComplete {
                    max_lines: rule.max_lines.max(),
                },
            );
        }

        if !poem.is_collaborative && author != poem.creator_id {
            return self.reject(poem, Rejection::NotCollaborator);
        }

        let position = accepted.saturating_add(1);
        if rule.turn_taking && poem.is_collaborative {
            if let Some(last) = lines.last() {
                if last.author_id == author {
                    return self.reject(poem, Rejection::ConsecutiveAuthor { position });
                }
            }
        }

        if candidate.trim().is_empty() {
            return self.reject(poem, Rejection::EmptyLine { position });
        }

        let Some(expected_syllables) = rule.expected_syllables(position) else {
            return Verdict::Pass;
        };
        let request = LineRequest {
            line: candidate,
            position,
            rule: &rule,
            expected_syllables,
        };
        match self.judge_structure(&request) {
            None => Verdict::Pass,
            Some(rejection) => self.reject(poem, rejection),
        }
    }

    /// Runs the strategy chain. `None` means accepted.
    fn judge_structure(&self, request: &LineRequest<'_>) -> Option<Rejection> {
        let mut note = None;
        for advisor in &self.advisors {
            match advisor.judge(request) {
                StrategyOutcome::Accept => {
                    debug!(
                        "event=structure_judged module=validation decided_by={} outcome=accept position={}",
                        advisor.name(),
                        request.position
                    );
                    return None;
                }
                StrategyOutcome::Reject(rejection) => return Some(rejection),
                StrategyOutcome::Abstain { note: advisor_note } => {
                    if advisor_note.is_some() {
                        note = advisor_note;
                    }
                }
            }
        }

        match self.authority.judge(request) {
            StrategyOutcome::Reject(Rejection::SyllableMismatch {
                position,
                expected,
                observed,
                ..
            }) => Some(Rejection::SyllableMismatch {
                position,
                expected,
                observed,
                oracle_note: note,
            }),
            StrategyOutcome::Reject(other) => Some(other),
            StrategyOutcome::Accept | StrategyOutcome::Abstain { .. } => None,
        }
    }

    fn reject(&self, poem: &Poem, rejection: Rejection) -> Verdict {
        debug!(
            "event=contribution_validate module=validation status=rejected poem_id={} form={} reason={}",
            poem.uuid,
            poem.form.storage_tag(),
            rejection.code()
        );
        Verdict::Fail(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::form::FormType;
    use crate::model::poem::PoemState;
    use crate::oracle::prompt::PromptContext;
    use crate::oracle::{OracleClient, OracleError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    struct FixedOracle {
        reply: Result<&'static str, OracleError>,
        calls: AtomicUsize,
    }

    impl FixedOracle {
        fn new(reply: Result<&'static str, OracleError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OracleClient for FixedOracle {
        fn request_judgment(&self, _context: &PromptContext) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(str::to_string)
        }
    }

    fn validator_with(oracle: Arc<FixedOracle>) -> ContributionValidator {
        ContributionValidator::with_oracle(OracleAdapter::new(oracle), SyllableEstimator::default())
    }

    fn poem(form: FormType) -> Poem {
        Poem::new("test", form, Uuid::new_v4(), true)
    }

    fn line(poem: &Poem, author: AuthorId, position: u32, content: &str) -> Contribution {
        Contribution {
            uuid: Uuid::new_v4(),
            poem_id: poem.uuid,
            author_id: author,
            content: content.to_string(),
            position,
            submitted_at: 0,
        }
    }

    #[test]
    fn oracle_pass_is_trusted_without_estimator() {
        let oracle = FixedOracle::new(Ok("Pass"));
        let validator = validator_with(oracle.clone());
        let poem = poem(FormType::Haiku);
        // Estimator says 6; oracle's pass wins.
        let verdict = validator.validate(&poem, &[], "An old and silent pond", Uuid::new_v4());
        assert_eq!(verdict, Verdict::Pass);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn oracle_fail_defers_to_estimator() {
        let validator = validator_with(FixedOracle::new(Ok("Fail: looks short")));
        let poem = poem(FormType::Haiku);
        let verdict = validator.validate(&poem, &[], "An old silent pond", Uuid::new_v4());
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn mismatch_carries_counts_and_oracle_note() {
        let validator = validator_with(FixedOracle::new(Ok("Fail: six syllables")));
        let poem = poem(FormType::Haiku);
        let verdict = validator.validate(&poem, &[], "An old and silent pond", Uuid::new_v4());
        assert_eq!(
            verdict,
            Verdict::Fail(Rejection::SyllableMismatch {
                position: 1,
                expected: 5,
                observed: 6,
                oracle_note: Some("Fail: six syllables".to_string()),
            })
        );
    }

    #[test]
    fn inconclusive_oracle_falls_back_silently() {
        let validator = validator_with(FixedOracle::new(Err(OracleError::Timeout)));
        let poem = poem(FormType::Haiku);
        let verdict = validator.validate(&poem, &[], "An old and silent pond", Uuid::new_v4());
        assert!(matches!(
            verdict,
            Verdict::Fail(Rejection::SyllableMismatch {
                oracle_note: None,
                ..
            })
        ));
    }

    #[test]
    fn complete_poem_rejects_any_content() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let mut poem = poem(FormType::FreeVerse);
        poem.state = PoemState::Complete;
        let verdict = validator.validate(&poem, &[], "anything at all", Uuid::new_v4());
        assert_eq!(
            verdict,
            Verdict::Fail(Rejection::PoemComplete { max_lines: None })
        );
    }

    #[test]
    fn full_line_count_rejects_before_turn_taking() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let poem = poem(FormType::Haiku);
        let author = Uuid::new_v4();
        let lines = vec![
            line(&poem, Uuid::new_v4(), 1, "An old silent pond"),
            line(&poem, Uuid::new_v4(), 2, "A frog jumps into the pond"),
            line(&poem, author, 3, "Splash! Silence again"),
        ];
        let verdict = validator.validate(&poem, &lines, "", author);
        assert_eq!(
            verdict,
            Verdict::Fail(Rejection::PoemComplete { max_lines: Some(3) })
        );
    }

    #[test]
    fn consecutive_author_rejected_before_structure() {
        let oracle = FixedOracle::new(Ok("Pass"));
        let validator = validator_with(oracle.clone());
        let poem = poem(FormType::Nonet);
        let author = Uuid::new_v4();
        let lines = vec![line(&poem, author, 1, "I walk the long dark road to my town")];
        let verdict = validator.validate(&poem, &lines, "we sing a soft song as we go", author);
        assert_eq!(
            verdict,
            Verdict::Fail(Rejection::ConsecutiveAuthor { position: 2 })
        );
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn free_verse_allows_same_author_and_any_length() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let poem = poem(FormType::FreeVerse);
        let author = Uuid::new_v4();
        let lines = vec![line(&poem, author, 1, "first")];
        let long_line = "word ".repeat(200);
        assert_eq!(
            validator.validate(&poem, &lines, &long_line, author),
            Verdict::Pass
        );
    }

    #[test]
    fn limerick_has_no_syllable_check() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let poem = poem(FormType::Limerick);
        assert_eq!(
            validator.validate(&poem, &[], "There once was a man from Nantucket", Uuid::new_v4()),
            Verdict::Pass
        );
    }

    #[test]
    fn blank_line_is_rejected() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let poem = poem(FormType::FreeVerse);
        assert_eq!(
            validator.validate(&poem, &[], "   ", Uuid::new_v4()),
            Verdict::Fail(Rejection::EmptyLine { position: 1 })
        );
    }

    #[test]
    fn individual_poem_accepts_creator_only() {
        let validator = ContributionValidator::new(SyllableEstimator::default());
        let creator = Uuid::new_v4();
        let poem = Poem::new("solo", FormType::FreeVerse, creator, false);
        assert_eq!(
            validator.validate(&poem, &[], "a line", Uuid::new_v4()),
            Verdict::Fail(Rejection::NotCollaborator)
        );
        let lines = vec![line(&poem, creator, 1, "a line")];
        assert_eq!(
            validator.validate(&poem, &lines, "another line", creator),
            Verdict::Pass
        );
    }
}
