//! Poem and contribution domain model.
//!
//! # Responsibility
//! - Define the poem record and its lifecycle state.
//! - Define the append-only contribution (line) record.
//!
//! # Invariants
//! - `line_count` mirrors the number of accepted contributions.
//! - `Draft` means zero lines; `Complete` is terminal.
//! - Contribution positions are 1-indexed and contiguous per poem.

use crate::model::form::{FormRule, FormType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable poem identifier.
pub type PoemId = Uuid;
/// Stable contribution identifier.
pub type ContributionId = Uuid;
/// Identity of a poet. Account management lives outside core.
pub type AuthorId = Uuid;

/// Poem lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoemState {
    /// No accepted lines yet.
    Draft,
    /// At least one line, not yet complete.
    InProgress,
    /// Read-only; accepts no more contributions.
    Complete,
}

impl PoemState {
    /// State implied by an accepted-line count under `rule`.
    ///
    /// Unbounded forms never reach `Complete` through line count alone.
    pub fn for_line_count(count: u32, rule: &FormRule) -> Self {
        if count == 0 {
            Self::Draft
        } else if rule.max_lines.is_reached_by(count) {
            Self::Complete
        } else {
            Self::InProgress
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }
}

/// Poem record owned by its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poem {
    pub uuid: PoemId,
    pub title: String,
    pub form: FormType,
    pub creator_id: AuthorId,
    /// Individual poems accept lines from their creator only.
    pub is_collaborative: bool,
    pub state: PoemState,
    pub line_count: u32,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Poem {
    /// Creates a draft poem with a generated stable ID.
    ///
    /// Timestamps are assigned by storage on insert.
    pub fn new(
        title: impl Into<String>,
        form: FormType,
        creator_id: AuthorId,
        is_collaborative: bool,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            form,
            creator_id,
            is_collaborative,
            state: PoemState::Draft,
            line_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn rule(&self) -> FormRule {
        self.form.rule()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }
}

/// One accepted line of a poem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub uuid: ContributionId,
    pub poem_id: PoemId,
    pub author_id: AuthorId,
    pub content: String,
    /// 1-indexed line position, assigned from submission order.
    pub position: u32,
    /// Unix epoch milliseconds.
    pub submitted_at: i64,
}

/// Read model returned to callers after every lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemSnapshot {
    pub poem: Poem,
    /// Accepted lines ordered by position.
    pub lines: Vec<Contribution>,
}

impl PoemSnapshot {
    pub fn state(&self) -> PoemState {
        self.poem.state
    }

    pub fn accepted_line_count(&self) -> u32 {
        self.poem.line_count
    }

    /// Full text so far, one contribution per line.
    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lines still needed to complete a bounded form.
    pub fn remaining_lines(&self) -> Option<u32> {
        self.poem
            .rule()
            .max_lines
            .max()
            .map(|max| max.saturating_sub(self.poem.line_count))
    }
}
