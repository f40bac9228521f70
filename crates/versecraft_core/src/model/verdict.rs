//! Validation outcomes.
//!
//! Rejections are expected, frequent results and are modelled as values,
//! not errors.

use std::fmt::{Display, Formatter};

/// Outcome of validating one candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Rejection),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Pass => None,
            Self::Fail(rejection) => Some(rejection),
        }
    }
}

/// User-facing reason a contribution was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The poem already holds its maximum number of lines, or was published.
    PoemComplete { max_lines: Option<u32> },
    /// Individual poem and the author is not its creator.
    NotCollaborator,
    /// Same author as the previous accepted line.
    ConsecutiveAuthor { position: u32 },
    /// Blank or whitespace-only text.
    EmptyLine { position: u32 },
    /// Estimated syllables differ from the contract for `position`.
    SyllableMismatch {
        position: u32,
        expected: u32,
        observed: u32,
        /// Explanation returned by the oracle, kept verbatim when it failed
        /// the line.
        oracle_note: Option<String>,
    },
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PoemComplete { .. } => "poem_complete",
            Self::NotCollaborator => "not_collaborator",
            Self::ConsecutiveAuthor { .. } => "consecutive_author",
            Self::EmptyLine { .. } => "empty_line",
            Self::SyllableMismatch { .. } => "syllable_mismatch",
        }
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoemComplete {
                max_lines: Some(max),
            } => write!(
                f,
                "this poem is complete with {max} lines and accepts no more contributions"
            ),
            Self::PoemComplete { max_lines: None } => {
                write!(f, "this poem is published and accepts no more contributions")
            }
            Self::NotCollaborator => {
                write!(f, "this poem is not collaborative; only its creator may add lines")
            }
            Self::ConsecutiveAuthor { position } => write!(
                f,
                "line {position}: you cannot contribute two consecutive lines"
            ),
            Self::EmptyLine { position } => write!(f, "line {position}: line is empty"),
            Self::SyllableMismatch {
                position,
                expected,
                observed,
                oracle_note,
            } => {
                write!(
                    f,
                    "line {position}: expected {expected} syllables, found {observed}"
                )?;
                if let Some(note) = oracle_note {
                    write!(f, " ({note})")?;
                }
                Ok(())
            }
        }
    }
}
