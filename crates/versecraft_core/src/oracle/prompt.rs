//! Judgment request construction and reply classification.

use crate::model::form::{rules_for, FormType};
use crate::oracle::{InconclusiveReason, OracleJudgment};
use once_cell::sync::Lazy;
use regex::Regex;

static PASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpass\b").expect("valid pass regex"));
static FAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfail\b").expect("valid fail regex"));

/// Everything the oracle needs to judge one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub form: FormType,
    /// Whole-poem contract, e.g. "5-7-5 syllables".
    pub structure: String,
    /// 1-indexed line position.
    pub position: u32,
    pub expected_syllables: Option<u32>,
    pub line: String,
}

impl PromptContext {
    pub fn new(line: impl Into<String>, position: u32, form: FormType) -> Self {
        let rule = rules_for(form);
        Self {
            form,
            structure: rule.describe_structure(),
            position,
            expected_syllables: rule.expected_syllables(position),
            line: line.into(),
        }
    }

    /// Natural-language request sent to the oracle.
    pub fn render(&self) -> String {
        let expectation = match self.expected_syllables {
            Some(count) => format!(
                "Line {} of this {} must have exactly {count} syllables.",
                self.position, self.form
            ),
            None => format!(
                "Line {} of this {} has no syllable requirement.",
                self.position, self.form
            ),
        };

        format!(
            "You are an expert poetry validator.\n\
             Form: {form}. Required structure: {structure}.\n\
             {expectation}\n\
             Line {position}: \"{line}\"\n\
             Judge this line only. If it meets the requirement, reply with the single word 'Pass'. \
             Otherwise reply 'Fail: ' followed by a concise explanation naming the line and the \
             syllable count you observed.",
            form = self.form,
            structure = self.structure,
            position = self.position,
            line = self.line.trim(),
        )
    }
}

/// Classifies a raw reply as `Pass`, `Fail` or `Inconclusive`.
///
/// A reply must mention exactly one of the two keywords (whole word, any
/// case) to be decisive.
pub fn classify_reply(reply: &str) -> OracleJudgment {
    let trimmed = reply.trim();
    match (PASS_RE.is_match(trimmed), FAIL_RE.is_match(trimmed)) {
        (true, false) => OracleJudgment::Pass,
        (false, true) => OracleJudgment::Fail {
            explanation: trimmed.to_string(),
        },
        _ => OracleJudgment::Inconclusive(InconclusiveReason::Ambiguous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_encodes_contract_position_and_text() {
        let context = PromptContext::new("A frog jumps into the pond", 2, FormType::Haiku);
        assert_eq!(context.expected_syllables, Some(7));
        let prompt = context.render();
        assert!(prompt.contains("5-7-5 syllables"));
        assert!(prompt.contains("exactly 7 syllables"));
        assert!(prompt.contains("Line 2: \"A frog jumps into the pond\""));
    }

    #[test]
    fn prompt_for_nonet_uses_decreasing_count() {
        let context = PromptContext::new("short", 8, FormType::Nonet);
        assert_eq!(context.expected_syllables, Some(2));
        assert!(context.render().contains("9-8-7-6-5-4-3-2-1 syllables"));
    }

    #[test]
    fn plain_pass_is_pass() {
        assert_eq!(classify_reply("Pass"), OracleJudgment::Pass);
        assert_eq!(classify_reply("  pass.\n"), OracleJudgment::Pass);
    }

    #[test]
    fn fail_keeps_explanation_verbatim() {
        let reply = "Fail: line 1 has 6 syllables, expected 5.";
        assert_eq!(
            classify_reply(reply),
            OracleJudgment::Fail {
                explanation: reply.to_string()
            }
        );
    }

    #[test]
    fn both_or_neither_keyword_is_ambiguous() {
        let ambiguous = OracleJudgment::Inconclusive(InconclusiveReason::Ambiguous);
        assert_eq!(classify_reply("It does not pass, so Fail"), ambiguous);
        assert_eq!(classify_reply("I am not sure."), ambiguous);
        assert_eq!(classify_reply(""), ambiguous);
    }

    #[test]
    fn keywords_must_be_whole_words() {
        assert_eq!(
            classify_reply("passage"),
            OracleJudgment::Inconclusive(InconclusiveReason::Ambiguous)
        );
        assert!(matches!(
            classify_reply("Failing that, Fail."),
            OracleJudgment::Fail { .. }
        ));
    }
}
