//! Poetic form types and their structural contracts.
//!
//! # Responsibility
//! - Define the closed set of supported forms.
//! - Map each form to one immutable `FormRule`.
//!
//! # Invariants
//! - Rules are static configuration; nothing mutates them at runtime.
//! - Syllable contracts use 1-indexed line positions and strict equality.
//! - Unknown form names are an error, never a silent default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const HAIKU_SYLLABLES: &[u32] = &[5, 7, 5];
const NONET_SYLLABLES: &[u32] = &[9, 8, 7, 6, 5, 4, 3, 2, 1];

/// Supported poetic forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    Haiku,
    Nonet,
    FreeVerse,
    Limerick,
}

impl FormType {
    /// Every supported form, in display order.
    pub const ALL: [FormType; 4] = [
        FormType::Haiku,
        FormType::Nonet,
        FormType::FreeVerse,
        FormType::Limerick,
    ];

    /// Human-readable name ("Free Verse", not "free_verse").
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Haiku => "Haiku",
            Self::Nonet => "Nonet",
            Self::FreeVerse => "Free Verse",
            Self::Limerick => "Limerick",
        }
    }

    /// Stable tag used in storage.
    pub fn storage_tag(self) -> &'static str {
        match self {
            Self::Haiku => "haiku",
            Self::Nonet => "nonet",
            Self::FreeVerse => "free_verse",
            Self::Limerick => "limerick",
        }
    }

    /// Structural contract for this form.
    pub fn rule(self) -> FormRule {
        rules_for(self)
    }
}

impl Display for FormType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FormType {
    type Err = UnknownFormType;

    /// Accepts display names and storage tags, ignoring case and treating
    /// spaces, dashes and underscores alike ("Free Verse" == "free_verse").
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "haiku" => Ok(Self::Haiku),
            "nonet" => Ok(Self::Nonet),
            "freeverse" => Ok(Self::FreeVerse),
            "limerick" => Ok(Self::Limerick),
            _ => Err(UnknownFormType(value.trim().to_string())),
        }
    }
}

/// Raised when a form name does not match any supported form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormType(pub String);

impl Display for UnknownFormType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown form type `{}`", self.0)
    }
}

impl Error for UnknownFormType {}

/// Maximum number of lines a form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLimit {
    Bounded(u32),
    Unbounded,
}

impl LineLimit {
    /// Returns true when `count` accepted lines fill the form.
    pub fn is_reached_by(self, count: u32) -> bool {
        match self {
            Self::Bounded(max) => count >= max,
            Self::Unbounded => false,
        }
    }

    pub fn max(self) -> Option<u32> {
        match self {
            Self::Bounded(max) => Some(max),
            Self::Unbounded => None,
        }
    }
}

/// Structural contract for one form type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormRule {
    pub form: FormType,
    pub max_lines: LineLimit,
    /// Expected syllables per 1-indexed line position, when the form has a
    /// syllable contract.
    pub syllables_per_line: Option<&'static [u32]>,
    /// Same author may not submit two consecutive lines.
    pub turn_taking: bool,
    /// Declared rhyme scheme. Not enforced.
    pub rhyme_scheme: Option<&'static str>,
}

impl FormRule {
    /// Expected syllable count for a 1-indexed position.
    ///
    /// Returns `None` when the form has no syllable contract or the position
    /// lies outside it.
    pub fn expected_syllables(&self, position: u32) -> Option<u32> {
        let contract = self.syllables_per_line?;
        let index = usize::try_from(position.checked_sub(1)?).ok()?;
        contract.get(index).copied()
    }

    pub fn has_syllable_contract(&self) -> bool {
        self.syllables_per_line.is_some()
    }

    /// Short description of the contract, e.g. "5-7-5 syllables".
    pub fn describe_structure(&self) -> String {
        match (self.syllables_per_line, self.max_lines) {
            (Some(contract), _) => {
                let counts = contract
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join("-");
                format!("{counts} syllables")
            }
            (None, LineLimit::Bounded(max)) => match self.rhyme_scheme {
                Some(scheme) => format!("{max} lines, rhyme scheme {scheme}"),
                None => format!("{max} lines"),
            },
            (None, LineLimit::Unbounded) => "no fixed structure".to_string(),
        }
    }
}

/// Returns the structural contract for `form`.
pub fn rules_for(form: FormType) -> FormRule {
    match form {
        FormType::Haiku => FormRule {
            form,
            max_lines: LineLimit::Bounded(3),
            syllables_per_line: Some(HAIKU_SYLLABLES),
            turn_taking: true,
            rhyme_scheme: None,
        },
        FormType::Nonet => FormRule {
            form,
            max_lines: LineLimit::Bounded(9),
            syllables_per_line: Some(NONET_SYLLABLES),
            turn_taking: true,
            rhyme_scheme: None,
        },
        FormType::FreeVerse => FormRule {
            form,
            max_lines: LineLimit::Unbounded,
            syllables_per_line: None,
            turn_taking: false,
            rhyme_scheme: None,
        },
        FormType::Limerick => FormRule {
            form,
            max_lines: LineLimit::Bounded(5),
            syllables_per_line: None,
            turn_taking: true,
            rhyme_scheme: Some("AABBA"),
        },
    }
}

/// Resolves a form by name and returns its contract.
pub fn rules_for_name(name: &str) -> Result<FormRule, UnknownFormType> {
    name.parse::<FormType>().map(rules_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haiku_contract_is_five_seven_five() {
        let rule = rules_for(FormType::Haiku);
        assert_eq!(rule.max_lines, LineLimit::Bounded(3));
        assert_eq!(rule.expected_syllables(1), Some(5));
        assert_eq!(rule.expected_syllables(2), Some(7));
        assert_eq!(rule.expected_syllables(3), Some(5));
        assert_eq!(rule.expected_syllables(4), None);
        assert_eq!(rule.expected_syllables(0), None);
    }

    #[test]
    fn nonet_line_expects_ten_minus_position() {
        let rule = rules_for(FormType::Nonet);
        for position in 1..=9 {
            assert_eq!(rule.expected_syllables(position), Some(10 - position));
        }
    }

    #[test]
    fn free_verse_has_no_structure() {
        let rule = rules_for(FormType::FreeVerse);
        assert_eq!(rule.max_lines, LineLimit::Unbounded);
        assert!(!rule.has_syllable_contract());
        assert!(!rule.turn_taking);
        assert!(!rule.max_lines.is_reached_by(u32::MAX));
    }

    #[test]
    fn limerick_keeps_rhyme_scheme_as_metadata_only() {
        let rule = rules_for(FormType::Limerick);
        assert_eq!(rule.max_lines, LineLimit::Bounded(5));
        assert_eq!(rule.rhyme_scheme, Some("AABBA"));
        assert!(!rule.has_syllable_contract());
    }

    #[test]
    fn form_names_parse_leniently() {
        assert_eq!("Free Verse".parse::<FormType>(), Ok(FormType::FreeVerse));
        assert_eq!("free_verse".parse::<FormType>(), Ok(FormType::FreeVerse));
        assert_eq!(" HAIKU ".parse::<FormType>(), Ok(FormType::Haiku));
        for form in FormType::ALL {
            assert_eq!(form.storage_tag().parse::<FormType>(), Ok(form));
            assert_eq!(form.display_name().parse::<FormType>(), Ok(form));
        }
    }

    #[test]
    fn unknown_form_is_an_error() {
        let err = rules_for_name("sonnet").unwrap_err();
        assert_eq!(err, UnknownFormType("sonnet".to_string()));
    }

    #[test]
    fn structure_description_matches_contract() {
        assert_eq!(rules_for(FormType::Haiku).describe_structure(), "5-7-5 syllables");
        assert_eq!(
            rules_for(FormType::Limerick).describe_structure(),
            "5 lines, rhyme scheme AABBA"
        );
        assert_eq!(
            rules_for(FormType::FreeVerse).describe_structure(),
            "no fixed structure"
        );
    }
}
