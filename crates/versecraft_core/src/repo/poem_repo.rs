//! Poem/contribution repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence operations consumed by the lifecycle service.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Contributions are append-only; positions are 1-indexed and contiguous.
//! - `append_contribution` writes the line and the poem's new count/state
//!   together or not at all.
//! - Read paths reject unknown form/state tags instead of defaulting them.

use crate::db::DbError;
use crate::model::form::FormType;
use crate::model::poem::{AuthorId, Contribution, Poem, PoemId, PoemState};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const POEM_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    form,
    creator_id,
    is_collaborative,
    state,
    line_count,
    created_at,
    updated_at
FROM poems";

const CONTRIBUTION_SELECT_SQL: &str = "SELECT
    uuid,
    poem_uuid,
    author_id,
    content,
    position,
    submitted_at
FROM contributions";

const APPEND_SAVEPOINT: &str = "append_contribution";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for poem persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(PoemId),
    /// Stored form tag does not name a supported form.
    UnknownFormType(String),
    /// Poem changed under the writer (complete, or count moved).
    Conflict(PoemId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "poem not found: {id}"),
            Self::UnknownFormType(tag) => write!(f, "unknown form type `{tag}` in poems.form"),
            Self::Conflict(id) => write!(f, "poem {id} changed during write"),
            Self::InvalidData(message) => write!(f, "invalid persisted poem data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which poems a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoemListFilter {
    /// Collaborative poems still accepting lines.
    OpenCollaborative,
    /// Complete poems of any kind.
    Completed,
}

impl PoemListFilter {
    fn where_clause(self) -> &'static str {
        match self {
            Self::OpenCollaborative => "is_collaborative = 1 AND state != 'complete'",
            Self::Completed => "state = 'complete'",
        }
    }
}

/// Persistence contract consumed by the lifecycle service.
pub trait PoemRepository {
    fn create_poem(&self, poem: &Poem) -> RepoResult<PoemId>;
    fn get_poem(&self, id: PoemId) -> RepoResult<Option<Poem>>;
    /// Accepted lines ordered by position.
    fn get_accepted_lines(&self, id: PoemId) -> RepoResult<Vec<Contribution>>;
    fn get_last_contribution(&self, id: PoemId) -> RepoResult<Option<Contribution>>;
    /// Appends one line at the next position and updates the poem's count,
    /// state and `updated_at` in the same atomic unit.
    fn append_contribution(
        &self,
        poem_id: PoemId,
        author_id: AuthorId,
        content: &str,
    ) -> RepoResult<Contribution>;
    fn set_poem_state(&self, id: PoemId, state: PoemState) -> RepoResult<()>;
    /// Most recently updated first.
    fn list_poems(&self, filter: PoemListFilter) -> RepoResult<Vec<Poem>>;
    /// Removes the poem; its contributions go with it.
    fn delete_poem(&self, id: PoemId) -> RepoResult<()>;
}

/// SQLite-backed poem repository.
///
/// Works on a plain connection or on an open `Transaction`, which derefs to
/// `Connection`.
pub struct SqlitePoemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePoemRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["poems", "contributions"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    /// Runs `write` inside a savepoint so it nests under an outer
    /// transaction and still rolls back on its own.
    fn in_savepoint<T>(&self, write: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {APPEND_SAVEPOINT};"))?;
        match write() {
            Ok(value) => {
                self.conn
                    .execute_batch(&format!("RELEASE {APPEND_SAVEPOINT};"))?;
                Ok(value)
            }
            Err(err) => {
                // The original error matters more than a failed rollback.
                let _ = self.conn.execute_batch(&format!(
                    "ROLLBACK TO {APPEND_SAVEPOINT}; RELEASE {APPEND_SAVEPOINT};"
                ));
                Err(err)
            }
        }
    }
}

impl PoemRepository for SqlitePoemRepository<'_> {
    fn create_poem(&self, poem: &Poem) -> RepoResult<PoemId> {
        self.conn.execute(
            "INSERT INTO poems (
                uuid,
                title,
                form,
                creator_id,
                is_collaborative,
                state,
                line_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                poem.uuid.to_string(),
                poem.title.as_str(),
                poem.form.storage_tag(),
                poem.creator_id.to_string(),
                bool_to_int(poem.is_collaborative),
                poem_state_to_db(poem.state),
                poem.line_count,
            ],
        )?;

        Ok(poem.uuid)
    }

    fn get_poem(&self, id: PoemId) -> RepoResult<Option<Poem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POEM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_poem_row(row)?));
        }

        Ok(None)
    }

    fn get_accepted_lines(&self, id: PoemId) -> RepoResult<Vec<Contribution>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTRIBUTION_SELECT_SQL}
             WHERE poem_uuid = ?1
             ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(parse_contribution_row(row)?);
        }

        Ok(lines)
    }

    fn get_last_contribution(&self, id: PoemId) -> RepoResult<Option<Contribution>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTRIBUTION_SELECT_SQL}
             WHERE poem_uuid = ?1
             ORDER BY position DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contribution_row(row)?));
        }

        Ok(None)
    }

    fn append_contribution(
        &self,
        poem_id: PoemId,
        author_id: AuthorId,
        content: &str,
    ) -> RepoResult<Contribution> {
        let poem_uuid = poem_id.to_string();
        self.in_savepoint(|| {
            let poem = self
                .get_poem(poem_id)?
                .ok_or(RepoError::NotFound(poem_id))?;
            if poem.is_complete() {
                return Err(RepoError::Conflict(poem_id));
            }

            let position = poem.line_count + 1;
            let next_state = PoemState::for_line_count(position, &poem.rule());
            let changed = self.conn.execute(
                "UPDATE poems
                 SET
                    line_count = ?2,
                    state = ?3,
                    updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
                 WHERE uuid = ?1
                   AND line_count = ?4
                   AND state != 'complete';",
                params![
                    poem_uuid.as_str(),
                    position,
                    poem_state_to_db(next_state),
                    poem.line_count,
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::Conflict(poem_id));
            }

            let contribution_id = Uuid::new_v4();
            self.conn.execute(
                "INSERT INTO contributions (
                    uuid,
                    poem_uuid,
                    author_id,
                    content,
                    position
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    contribution_id.to_string(),
                    poem_uuid.as_str(),
                    author_id.to_string(),
                    content,
                    position,
                ],
            )?;

            let submitted_at: i64 = self.conn.query_row(
                "SELECT submitted_at FROM contributions WHERE uuid = ?1;",
                [contribution_id.to_string()],
                |row| row.get(0),
            )?;

            Ok(Contribution {
                uuid: contribution_id,
                poem_id,
                author_id,
                content: content.to_string(),
                position,
                submitted_at,
            })
        })
    }

    fn set_poem_state(&self, id: PoemId, state: PoemState) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE poems
             SET
                state = ?2,
                updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), poem_state_to_db(state)],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_poems(&self, filter: PoemListFilter) -> RepoResult<Vec<Poem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{POEM_SELECT_SQL}
             WHERE {}
             ORDER BY updated_at DESC, uuid ASC;",
            filter.where_clause()
        ))?;
        let mut rows = stmt.query([])?;
        let mut poems = Vec::new();
        while let Some(row) = rows.next()? {
            poems.push(parse_poem_row(row)?);
        }

        Ok(poems)
    }

    fn delete_poem(&self, id: PoemId) -> RepoResult<()> {
        // contributions.poem_uuid cascades; needs foreign_keys=ON.
        let changed = self
            .conn
            .execute("DELETE FROM poems WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_poem_row(row: &Row<'_>) -> RepoResult<Poem> {
    let form_text: String = row.get("form")?;
    let form = form_text
        .parse::<FormType>()
        .map_err(|_| RepoError::UnknownFormType(form_text.clone()))?;

    let state_text: String = row.get("state")?;
    let state = parse_poem_state(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid poem state `{state_text}` in poems.state"))
    })?;

    let is_collaborative = match row.get::<_, i64>("is_collaborative")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_collaborative value `{other}` in poems.is_collaborative"
            )));
        }
    };

    Ok(Poem {
        uuid: parse_uuid(row, "uuid", "poems.uuid")?,
        title: row.get("title")?,
        form,
        creator_id: parse_uuid(row, "creator_id", "poems.creator_id")?,
        is_collaborative,
        state,
        line_count: row.get("line_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_contribution_row(row: &Row<'_>) -> RepoResult<Contribution> {
    Ok(Contribution {
        uuid: parse_uuid(row, "uuid", "contributions.uuid")?,
        poem_id: parse_uuid(row, "poem_uuid", "contributions.poem_uuid")?,
        author_id: parse_uuid(row, "author_id", "contributions.author_id")?,
        content: row.get("content")?,
        position: row.get("position")?,
        submitted_at: row.get("submitted_at")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {label}")))
}

fn poem_state_to_db(state: PoemState) -> &'static str {
    match state {
        PoemState::Draft => "draft",
        PoemState::InProgress => "in_progress",
        PoemState::Complete => "complete",
    }
}

fn parse_poem_state(value: &str) -> Option<PoemState> {
    match value {
        "draft" => Some(PoemState::Draft),
        "in_progress" => Some(PoemState::InProgress),
        "complete" => Some(PoemState::Complete),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
