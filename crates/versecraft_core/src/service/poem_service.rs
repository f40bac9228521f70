//! Poem lifecycle use-case service.
//!
//! # Responsibility
//! - Create, list and delete poems.
//! - Validate and submit contributions, publish open forms.
//! - Move poems through `Draft -> InProgress -> Complete`.
//! - Normalize persistence failures into `ServiceError`.
//!
//! # Invariants
//! - Accept-and-transition runs under SQLite's write lock (`IMMEDIATE`
//!   transaction); the verdict that admits a line was computed against the
//!   exact count/state visible under that lock.
//! - A rejected or failed submission leaves no contribution row and no state
//!   change.
//! - Only the creator may delete a poem, and collaborative poems are never
//!   deleted.
//! - Oracle calls normally run outside the write lock; they only run under it
//!   when the poem moved between the first read and the lock.

use crate::model::form::{FormType, LineLimit};
use crate::model::poem::{AuthorId, Contribution, Poem, PoemId, PoemSnapshot, PoemState};
use crate::model::verdict::Verdict;
use crate::repo::poem_repo::{PoemListFilter, PoemRepository, RepoError, SqlitePoemRepository};
use crate::validation::ContributionValidator;
use log::{debug, error, info};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why an explicit publish was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishBlocker {
    /// Bounded forms complete by line count only.
    BoundedForm,
    /// Nothing to publish yet.
    NoLines,
    AlreadyComplete,
}

impl Display for PublishBlocker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoundedForm => write!(f, "form completes when its last line is accepted"),
            Self::NoLines => write!(f, "poem has no lines yet"),
            Self::AlreadyComplete => write!(f, "poem is already complete"),
        }
    }
}

/// Service error for poem lifecycle use-cases.
#[derive(Debug)]
pub enum ServiceError {
    PoemNotFound(PoemId),
    /// Stored form configuration is invalid.
    UnknownFormType(String),
    /// Title is empty after trimming.
    InvalidTitle,
    PublishNotAllowed {
        poem_id: PoemId,
        blocker: PublishBlocker,
    },
    /// Collaborative poems belong to every contributor.
    CollaborativeDeletion(PoemId),
    NotPoemOwner {
        poem_id: PoemId,
        requester: AuthorId,
    },
    /// Storage failed; the operation was rolled back.
    PersistenceFailure(RepoError),
}

impl ServiceError {
    fn persistence(err: impl Into<RepoError>) -> Self {
        Self::PersistenceFailure(err.into())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoemNotFound(id) => write!(f, "poem not found: {id}"),
            Self::UnknownFormType(tag) => {
                write!(f, "poem form configuration is invalid: unknown form type `{tag}`")
            }
            Self::InvalidTitle => write!(f, "poem title must not be empty"),
            Self::PublishNotAllowed { poem_id, blocker } => {
                write!(f, "poem {poem_id} cannot be published: {blocker}")
            }
            Self::CollaborativeDeletion(id) => {
                write!(f, "poem {id} is collaborative and cannot be deleted")
            }
            Self::NotPoemOwner { poem_id, requester } => {
                write!(f, "author {requester} did not create poem {poem_id}")
            }
            Self::PersistenceFailure(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::PoemNotFound(id),
            RepoError::UnknownFormType(tag) => Self::UnknownFormType(tag),
            other => Self::PersistenceFailure(other),
        }
    }
}

/// Outcome of one `validate` or `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub verdict: Verdict,
    /// Poem as stored after the call; unchanged on rejection and by
    /// `validate`.
    pub snapshot: PoemSnapshot,
    /// The stored line when `submit` passes; always `None` from `validate`.
    pub accepted: Option<Contribution>,
}

/// Lifecycle controller over one SQLite connection.
pub struct PoemService<'a> {
    conn: &'a mut Connection,
    validator: &'a ContributionValidator,
}

impl<'a> PoemService<'a> {
    pub fn new(conn: &'a mut Connection, validator: &'a ContributionValidator) -> Self {
        Self { conn, validator }
    }

    /// Creates a draft poem with no lines.
    pub fn create_poem(
        &mut self,
        title: &str,
        form: FormType,
        creator_id: AuthorId,
        is_collaborative: bool,
    ) -> ServiceResult<PoemSnapshot> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidTitle);
        }

        let poem = Poem::new(title, form, creator_id, is_collaborative);
        let repo = SqlitePoemRepository::try_new(&*self.conn).map_err(ServiceError::persistence)?;
        repo.create_poem(&poem).map_err(ServiceError::persistence)?;
        info!(
            "event=poem_create module=service status=ok poem_id={} form={} collaborative={}",
            poem.uuid,
            form.storage_tag(),
            is_collaborative
        );
        load_snapshot(&repo, poem.uuid)
    }

    /// Current poem state, lines and full text.
    pub fn snapshot(&mut self, poem_id: PoemId) -> ServiceResult<PoemSnapshot> {
        self.read_view(poem_id)
    }

    /// Poems matching `filter`, most recently updated first.
    pub fn list_poems(&mut self, filter: PoemListFilter) -> ServiceResult<Vec<Poem>> {
        let repo = SqlitePoemRepository::try_new(&*self.conn).map_err(ServiceError::persistence)?;
        let poems = repo.list_poems(filter)?;
        debug!(
            "event=poem_list module=service status=ok filter={:?} count={}",
            filter,
            poems.len()
        );
        Ok(poems)
    }

    /// Validates a candidate line against the current poem without
    /// persisting anything.
    pub fn validate(
        &mut self,
        poem_id: PoemId,
        candidate: &str,
        author_id: AuthorId,
    ) -> ServiceResult<Submission> {
        let snapshot = self.read_view(poem_id)?;
        let verdict = self
            .validator
            .validate(&snapshot.poem, &snapshot.lines, candidate, author_id);
        Ok(Submission {
            verdict,
            snapshot,
            accepted: None,
        })
    }

    /// Validates and, on `Pass`, stores a line and advances the lifecycle.
    ///
    /// # Side effects
    /// - On `Pass`: one contribution row; poem count/state updated in the
    ///   same transaction.
    /// - On rejection or error: nothing is written.
    pub fn submit(
        &mut self,
        poem_id: PoemId,
        candidate: &str,
        author_id: AuthorId,
    ) -> ServiceResult<Submission> {
        let started_at = Instant::now();
        let view = self.read_view(poem_id)?;
        let mut verdict = self
            .validator
            .validate(&view.poem, &view.lines, candidate, author_id);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(ServiceError::persistence)?;
        let repo = SqlitePoemRepository::try_new(&tx).map_err(ServiceError::persistence)?;
        let current = load_snapshot(&repo, poem_id)?;

        if current.poem.line_count != view.poem.line_count || current.poem.state != view.poem.state
        {
            debug!(
                "event=contribution_revalidate module=service poem_id={} seen_count={} locked_count={}",
                poem_id, view.poem.line_count, current.poem.line_count
            );
            verdict = self
                .validator
                .validate(&current.poem, &current.lines, candidate, author_id);
        }

        if let Verdict::Fail(rejection) = &verdict {
            info!(
                "event=contribution_submit module=service status=rejected poem_id={} reason={} duration_ms={}",
                poem_id,
                rejection.code(),
                started_at.elapsed().as_millis()
            );
            return Ok(Submission {
                verdict,
                snapshot: current,
                accepted: None,
            });
        }

        let accepted = match repo.append_contribution(poem_id, author_id, candidate.trim()) {
            Ok(contribution) => contribution,
            Err(err) => {
                error!(
                    "event=contribution_submit module=service status=error poem_id={} error_code=append_failed error={}",
                    poem_id, err
                );
                return Err(ServiceError::persistence(err));
            }
        };
        let snapshot = load_snapshot(&repo, poem_id)?;
        if let Err(err) = tx.commit() {
            error!(
                "event=contribution_submit module=service status=error poem_id={} error_code=commit_failed error={}",
                poem_id, err
            );
            return Err(ServiceError::persistence(err));
        }

        info!(
            "event=contribution_submit module=service status=ok poem_id={} position={} state={:?} duration_ms={} line_chars={}",
            poem_id,
            accepted.position,
            snapshot.state(),
            started_at.elapsed().as_millis(),
            accepted.content.chars().count()
        );
        if snapshot.state() == PoemState::Complete {
            info!(
                "event=poem_complete module=service status=ok poem_id={} lines={}",
                poem_id,
                snapshot.accepted_line_count()
            );
        }

        Ok(Submission {
            verdict,
            snapshot,
            accepted: Some(accepted),
        })
    }

    /// Marks an open-ended poem complete.
    ///
    /// Only forms without a line limit can be published explicitly; bounded
    /// forms complete when their last line is accepted.
    pub fn publish(&mut self, poem_id: PoemId) -> ServiceResult<PoemSnapshot> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(ServiceError::persistence)?;
        let repo = SqlitePoemRepository::try_new(&tx).map_err(ServiceError::persistence)?;
        let current = load_snapshot(&repo, poem_id)?;

        let blocker = if current.poem.is_complete() {
            Some(PublishBlocker::AlreadyComplete)
        } else if matches!(current.poem.rule().max_lines, LineLimit::Bounded(_)) {
            Some(PublishBlocker::BoundedForm)
        } else if current.poem.line_count == 0 {
            Some(PublishBlocker::NoLines)
        } else {
            None
        };
        if let Some(blocker) = blocker {
            return Err(ServiceError::PublishNotAllowed { poem_id, blocker });
        }

        repo.set_poem_state(poem_id, PoemState::Complete)
            .map_err(ServiceError::persistence)?;
        let snapshot = load_snapshot(&repo, poem_id)?;
        tx.commit().map_err(ServiceError::persistence)?;

        info!(
            "event=poem_publish module=service status=ok poem_id={} lines={}",
            poem_id,
            snapshot.accepted_line_count()
        );
        Ok(snapshot)
    }

    /// Deletes a poem and all of its lines.
    ///
    /// Collaborative poems are refused before ownership is checked.
    pub fn delete_poem(&mut self, poem_id: PoemId, requester: AuthorId) -> ServiceResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(ServiceError::persistence)?;
        let repo = SqlitePoemRepository::try_new(&tx).map_err(ServiceError::persistence)?;
        let poem = repo
            .get_poem(poem_id)?
            .ok_or(ServiceError::PoemNotFound(poem_id))?;

        if poem.is_collaborative {
            info!(
                "event=poem_delete module=service status=rejected poem_id={} reason=collaborative",
                poem_id
            );
            return Err(ServiceError::CollaborativeDeletion(poem_id));
        }
        if poem.creator_id != requester {
            info!(
                "event=poem_delete module=service status=rejected poem_id={} reason=not_owner",
                poem_id
            );
            return Err(ServiceError::NotPoemOwner { poem_id, requester });
        }

        repo.delete_poem(poem_id)?;
        tx.commit().map_err(ServiceError::persistence)?;
        info!(
            "event=poem_delete module=service status=ok poem_id={} lines={}",
            poem_id, poem.line_count
        );
        Ok(())
    }

    /// Consistent read of poem + lines in one deferred transaction.
    fn read_view(&mut self, poem_id: PoemId) -> ServiceResult<PoemSnapshot> {
        let tx = self.conn.transaction().map_err(ServiceError::persistence)?;
        let repo = SqlitePoemRepository::try_new(&tx).map_err(ServiceError::persistence)?;
        load_snapshot(&repo, poem_id)
    }
}

fn load_snapshot(repo: &impl PoemRepository, poem_id: PoemId) -> ServiceResult<PoemSnapshot> {
    let poem = repo
        .get_poem(poem_id)?
        .ok_or(ServiceError::PoemNotFound(poem_id))?;
    let lines = repo.get_accepted_lines(poem_id)?;
    Ok(PoemSnapshot { poem, lines })
}
