//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note persistence APIs over the `notes` table.
//! - Join owner identity rows for list/detail read models.
//! - Render write scopes into conditional `UPDATE`/`DELETE` statements.
//!
//! # Invariants
//! - The live predicate (`deleted_at IS NULL`) is defined once in
//!   `LIVE_PREDICATE` and shared by every read and write path.
//! - List results are ordered `created_at DESC`, newest insert first on ties.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::identity::{OwnerSummary, Role, UserId};
use crate::model::note::{Note, NoteId, NotePatch, NoteStatus, NoteView};
use crate::repo::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const LIVE_PREDICATE: &str = "deleted_at IS NULL";

const NOTE_COLUMNS: &str =
    "id, title, content, status, user_id, created_at, updated_at, deleted_at";

const NOTE_VIEW_SELECT_SQL: &str = "SELECT
    n.id,
    n.title,
    n.content,
    n.status,
    n.user_id,
    n.created_at,
    n.updated_at,
    n.deleted_at,
    u.name AS owner_name,
    u.email AS owner_email,
    u.role AS owner_role
FROM notes n
INNER JOIN users u ON u.id = n.user_id";

/// Which rows a point lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows passing the live predicate.
    Live,
    /// Live and soft-deleted rows alike.
    Any,
}

/// Filter options for note listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Restrict to notes owned by this identity; `None` lists every owner.
    pub owner: Option<UserId>,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
    /// Attach owner summaries to the returned views.
    pub with_owner: bool,
}

/// Row predicate a conditional write must still satisfy when it executes.
///
/// Mirrors the checks the caller performed before issuing the write, so a row
/// that changed state in between is reported as `NotFound` instead of being
/// mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteScope {
    /// Require the live predicate.
    pub live_only: bool,
    /// Require `user_id` to match.
    pub owner: Option<UserId>,
}

impl WriteScope {
    /// Scope that matches the row by id only.
    pub fn any_row() -> Self {
        Self::default()
    }

    /// Scope that matches only live rows, optionally restricted to an owner.
    pub fn live(owner: Option<UserId>) -> Self {
        Self {
            live_only: true,
            owner,
        }
    }
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Persists a new note row.
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Gets one note joined with its owner summary.
    fn find_note(&self, id: NoteId, visibility: Visibility) -> RepoResult<Option<NoteView>>;
    /// Lists notes matching the query, newest first.
    fn list_notes(&self, query: &NoteQuery) -> RepoResult<Vec<NoteView>>;
    /// Applies the present patch fields and stamps `updated_at`.
    fn update_note(
        &self,
        id: NoteId,
        patch: &NotePatch,
        updated_at: i64,
        scope: &WriteScope,
    ) -> RepoResult<Note>;
    /// Sets or clears the soft-delete tombstone.
    fn set_deleted_at(
        &self,
        id: NoteId,
        deleted_at: Option<i64>,
        scope: &WriteScope,
    ) -> RepoResult<Note>;
    /// Physically removes the row and returns its last state.
    fn delete_note(&self, id: NoteId) -> RepoResult<Note>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "notes",
            &[
                "id",
                "title",
                "content",
                "status",
                "user_id",
                "created_at",
                "updated_at",
                "deleted_at",
            ],
        )?;
        ensure_table_ready(conn, "users", &["id", "name", "email", "role"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                id,
                title,
                content,
                status,
                user_id,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_deref(),
                note.status.as_str(),
                note.user_id.to_string(),
                note.created_at,
                note.updated_at,
                note.deleted_at,
            ],
        )?;

        Ok(note.id)
    }

    fn find_note(&self, id: NoteId, visibility: Visibility) -> RepoResult<Option<NoteView>> {
        let mut sql = format!("{NOTE_VIEW_SELECT_SQL} WHERE n.id = ?1");
        if visibility == Visibility::Live {
            sql.push_str(" AND ");
            sql.push_str(LIVE_PREDICATE);
        }

        self.conn
            .query_row(&sql, [id.to_string()], |row| {
                Ok(parse_note_view_row(row, true))
            })
            .optional()?
            .transpose()
    }

    fn list_notes(&self, query: &NoteQuery) -> RepoResult<Vec<NoteView>> {
        let mut sql = format!("{NOTE_VIEW_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND ");
            sql.push_str(LIVE_PREDICATE);
        }

        if let Some(owner) = query.owner {
            sql.push_str(" AND n.user_id = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        sql.push_str(" ORDER BY n.created_at DESC, n.rowid DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_view_row(row, query.with_owner)?);
        }

        Ok(notes)
    }

    fn update_note(
        &self,
        id: NoteId,
        patch: &NotePatch,
        updated_at: i64,
        scope: &WriteScope,
    ) -> RepoResult<Note> {
        patch.validate()?;

        let mut assignments = vec!["updated_at = ?"];
        let mut bind_values: Vec<Value> = vec![Value::Integer(updated_at)];

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        let sql = format!("UPDATE notes SET {}", assignments.join(", "));
        self.scoped_write(sql, bind_values, id, scope)
    }

    fn set_deleted_at(
        &self,
        id: NoteId,
        deleted_at: Option<i64>,
        scope: &WriteScope,
    ) -> RepoResult<Note> {
        let bind_values = vec![deleted_at.map_or(Value::Null, Value::Integer)];
        self.scoped_write(
            "UPDATE notes SET deleted_at = ?".to_string(),
            bind_values,
            id,
            scope,
        )
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<Note> {
        self.scoped_write(
            "DELETE FROM notes".to_string(),
            Vec::new(),
            id,
            &WriteScope::any_row(),
        )
    }
}

impl SqliteNoteRepository<'_> {
    /// Appends the id and scope predicates plus `RETURNING` to `statement`
    /// and runs it, mapping "no row matched" to `NotFound`.
    fn scoped_write(
        &self,
        statement: String,
        mut bind_values: Vec<Value>,
        id: NoteId,
        scope: &WriteScope,
    ) -> RepoResult<Note> {
        let mut sql = statement;
        sql.push_str(" WHERE id = ?");
        bind_values.push(Value::Text(id.to_string()));

        if scope.live_only {
            sql.push_str(" AND ");
            sql.push_str(LIVE_PREDICATE);
        }
        if let Some(owner) = scope.owner {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        sql.push_str(" RETURNING ");
        sql.push_str(NOTE_COLUMNS);
        sql.push(';');

        self.conn
            .query_row(&sql, params_from_iter(bind_values), |row| {
                Ok(parse_note_row(row))
            })
            .optional()?
            .ok_or(RepoError::NotFound(id))?
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("user_id")?;
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<NoteStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in notes.status"))
    })?;

    let note = Note {
        id: parse_uuid(&id_text, "notes.id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        status,
        user_id: parse_uuid(&owner_text, "notes.user_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    note.validate().map_err(|err| {
        RepoError::InvalidData(format!("note {} violates invariants: {err}", note.id))
    })?;
    Ok(note)
}

fn parse_note_view_row(row: &Row<'_>, with_owner: bool) -> RepoResult<NoteView> {
    let note = parse_note_row(row)?;
    let owner = if with_owner {
        let role_text: String = row.get("owner_role")?;
        let role = role_text.parse::<Role>().map_err(|_| {
            RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
        })?;
        Some(OwnerSummary {
            id: note.user_id,
            name: row.get("owner_name")?,
            email: row.get("owner_email")?,
            role,
        })
    } else {
        None
    };

    Ok(NoteView { note, owner })
}
