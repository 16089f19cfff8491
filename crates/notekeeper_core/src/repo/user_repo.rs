//! Identity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Mirror identities issued by the identity provider into `users`.
//! - Provide the owner rows that `notes.user_id` references.
//!
//! # Invariants
//! - Deleting a user cascades to every note it owns (`ON DELETE CASCADE`).
//! - Emails are unique, compared case-insensitively.

use crate::model::identity::{Role, User, UserId};
use crate::repo::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, name, email, role, created_at FROM users";

/// Repository interface for identity rows.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Removes the identity and, through the foreign key, all of its notes.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed identity repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "users",
            &["id", "name", "email", "role", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (id, name, email, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.name.trim(),
                user.email.trim(),
                user.role.as_str(),
                user.created_at,
            ],
        )?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"),
                [email.trim()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY email COLLATE NOCASE ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let role_text: String = row.get("role")?;
    let role = role_text.parse::<Role>().map_err(|_| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role,
        created_at: row.get("created_at")?,
    })
}
