//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its create/patch inputs.
//! - Provide title/status validation shared by every write path.
//!
//! # Invariants
//! - `title` is 1..=256 characters.
//! - `user_id` and `created_at` never change after creation.
//! - `deleted_at.is_some()` marks a soft-deleted (tombstoned) note.

use crate::model::identity::{OwnerSummary, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a note.
pub type NoteId = Uuid;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 256;

/// Editorial state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Draft,
    #[default]
    Active,
    Archived,
}

impl NoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for NoteStatus {
    type Err = NoteValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(NoteValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Field-level validation failures for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty.
    EmptyTitle,
    /// Title exceeds `TITLE_MAX_CHARS`.
    TitleTooLong { len: usize, max: usize },
    /// Status is not one of `draft|active|archived`.
    InvalidStatus(String),
    /// Note id is not a UUID.
    InvalidId(String),
}

impl NoteValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::InvalidStatus(_) => "status",
            Self::InvalidId(_) => "id",
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Title is required"),
            Self::TitleTooLong { len, max } => {
                write!(f, "Title must be {max} characters or less (got {len})")
            }
            Self::InvalidStatus(value) => {
                write!(f, "invalid status `{value}`; expected draft|active|archived")
            }
            Self::InvalidId(value) => write!(f, "invalid note id `{value}`"),
        }
    }
}

impl Error for NoteValidationError {}

/// Validates a note title against the 1..=256 character rule.
pub fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    if title.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > TITLE_MAX_CHARS {
        return Err(NoteValidationError::TitleTooLong {
            len,
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}

/// Parses a note id from its textual form.
pub fn parse_note_id(value: &str) -> Result<NoteId, NoteValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| NoteValidationError::InvalidId(value.to_string()))
}

/// Canonical persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: Option<String>,
    pub status: NoteStatus,
    /// Owner reference, stamped from the acting identity.
    pub user_id: UserId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last mutating update.
    pub updated_at: Option<i64>,
    /// Soft-delete tombstone in Unix epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl Note {
    /// Builds a new live note owned by `user_id` with a generated id.
    pub fn new(input: CreateNoteInput, user_id: UserId, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            status: input.status.unwrap_or_default(),
            user_id,
            created_at,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Checks persisted-state invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_title(&self.title)
    }

    /// Returns whether this note is visible to regular read paths.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Note read model with optional owner identity attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<OwnerSummary>,
}

/// Client input for note creation.
///
/// Unknown fields (`id`, `userId`, timestamps) are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<NoteStatus>,
}

impl CreateNoteInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_title(&self.title)
    }
}

/// Partial update; only present fields are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<NoteStatus>,
}

impl NotePatch {
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        match self.title.as_deref() {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.status.is_none()
    }
}

/// Listing flags for note queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteListOptions {
    pub include_deleted: bool,
}
